use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::image::ImageData;

/// Pixel share of one segmentation class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassShare {
    #[serde(default)]
    pub pixel_count: u64,
    pub percentage: f64,
}

impl ClassShare {
    pub fn new(pixel_count: u64, percentage: f64) -> Self {
        Self {
            pixel_count,
            percentage,
        }
    }

    /// Share known only by its percentage (pixel count unknown).
    pub fn from_percentage(percentage: f64) -> Self {
        Self::new(0, percentage)
    }
}

/// Per-class pixel distribution of an analyzed image.
///
/// Keeps the key order it was built or deserialized with, because the
/// distribution table is rendered in source order. Lookups by key never
/// depend on that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassDistribution {
    entries: Vec<(String, ClassShare)>,
}

impl ClassDistribution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a class. A replaced key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, share: ClassShare) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = share,
            None => self.entries.push((key, share)),
        }
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, share: ClassShare) -> Self {
        self.insert(key, share);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ClassShare> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, share)| share)
    }

    pub fn percentage(&self, key: &str) -> Option<f64> {
        self.get(key).map(|share| share.percentage)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ClassShare)> {
        self.entries.iter().map(|(k, share)| (k.as_str(), share))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, ClassShare)> for ClassDistribution {
    fn from_iter<I: IntoIterator<Item = (K, ClassShare)>>(iter: I) -> Self {
        let mut distribution = Self::new();
        for (key, share) in iter {
            distribution.insert(key, share);
        }
        distribution
    }
}

impl Serialize for ClassDistribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, share) in &self.entries {
            map.serialize_entry(key, share)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ClassDistribution {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DistributionVisitor;

        impl<'de> Visitor<'de> for DistributionVisitor {
            type Value = ClassDistribution;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of class name to {pixel_count, percentage}")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut distribution = ClassDistribution::new();
                while let Some((key, share)) = access.next_entry::<String, ClassShare>()? {
                    distribution.insert(key, share);
                }
                Ok(distribution)
            }
        }

        deserializer.deserialize_map(DistributionVisitor)
    }
}

/// Everything the inference service returns for one scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub segmented_image: ImageData,
    pub inference_time_seconds: f64,
    pub class_distribution: ClassDistribution,
    pub image_shape: Vec<u32>,
}

impl AnalysisResult {
    /// `[H, W, C]` rendered as `"H x W x C"`.
    pub fn image_dimensions(&self) -> String {
        self.image_shape
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(" x ")
    }
}
