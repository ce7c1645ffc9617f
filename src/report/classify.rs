//! Class distribution → diagnostic findings.
//!
//! Conditions are a static rule table evaluated in order; adding a condition
//! means adding a row. Pure and deterministic: no I/O, never fails.

use crate::models::{ClassDistribution, Finding, Severity};

use super::settings::Thresholds;

/// One thresholded condition keyed on a segmentation class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionRule {
    pub class_key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

/// Evaluated in this order; findings come out in this order.
pub const CONDITION_RULES: &[ConditionRule] = &[
    ConditionRule {
        class_key: "class_1",
        name: "Caries (Tooth Decay)",
        description: "Dental caries detected in the scan. This indicates tooth decay that may require dental treatment.",
    },
    ConditionRule {
        class_key: "class_2",
        name: "Gingivitis (Gum Inflammation)",
        description: "Gum inflammation detected. This condition may lead to periodontal disease if left untreated.",
    },
    ConditionRule {
        class_key: "class_3",
        name: "Plaque/Tartar Buildup",
        description: "Plaque or tartar buildup detected. Professional cleaning is recommended.",
    },
];

pub const BACKGROUND_KEY: &str = "background";
pub const HEALTHY_NAME: &str = "Healthy Teeth";
pub const HEALTHY_DESCRIPTION: &str =
    "No significant dental issues detected. Continue regular dental hygiene practices.";

/// Classifies with the default 5% / 15% thresholds.
pub fn classify(distribution: &ClassDistribution) -> Vec<Finding> {
    classify_with(distribution, &Thresholds::default())
}

/// Never returns an empty list: with no triggered condition a single
/// "Healthy Teeth" finding is synthesized.
pub fn classify_with(distribution: &ClassDistribution, thresholds: &Thresholds) -> Vec<Finding> {
    let mut findings: Vec<Finding> = CONDITION_RULES
        .iter()
        .filter_map(|rule| evaluate_rule(rule, distribution, thresholds))
        .collect();

    if findings.is_empty() {
        findings.push(healthy_finding(distribution));
    }

    tracing::debug!(
        findings = findings.len(),
        classes = distribution.len(),
        "Classified distribution"
    );
    findings
}

fn evaluate_rule(
    rule: &ConditionRule,
    distribution: &ClassDistribution,
    thresholds: &Thresholds,
) -> Option<Finding> {
    let percentage = distribution.percentage(rule.class_key)?;
    // Strict: NaN and exact-threshold values never trigger.
    (percentage > thresholds.trigger).then(|| Finding {
        name: rule.name.to_string(),
        confidence_percent: percentage,
        severity: severity_for(percentage, thresholds),
        description: rule.description.to_string(),
    })
}

/// Tier for a percentage that already passed the trigger threshold.
pub fn severity_for(percentage: f64, thresholds: &Thresholds) -> Severity {
    if percentage > thresholds.high {
        Severity::High
    } else {
        Severity::Moderate
    }
}

fn healthy_finding(distribution: &ClassDistribution) -> Finding {
    Finding {
        name: HEALTHY_NAME.to_string(),
        confidence_percent: distribution.percentage(BACKGROUND_KEY).unwrap_or(100.0),
        severity: Severity::None,
        description: HEALTHY_DESCRIPTION.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClassShare;

    fn dist(entries: &[(&str, f64)]) -> ClassDistribution {
        entries
            .iter()
            .map(|(k, p)| (*k, ClassShare::from_percentage(*p)))
            .collect()
    }

    #[test]
    fn mostly_background_is_healthy() {
        let findings = classify(&dist(&[("background", 96.0), ("class_1", 4.0)]));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].name, HEALTHY_NAME);
        assert_eq!(findings[0].severity, Severity::None);
        assert_eq!(findings[0].confidence_percent, 96.0);
    }

    #[test]
    fn high_caries_without_fallback() {
        let findings = classify(&dist(&[("class_1", 20.0), ("class_2", 3.0)]));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].name, "Caries (Tooth Decay)");
        assert_eq!(findings[0].severity, Severity::High);
        assert_eq!(findings[0].confidence_percent, 20.0);
    }

    #[test]
    fn boundary_five_is_excluded_everywhere() {
        let findings = classify(&dist(&[("class_1", 5.0), ("class_2", 5.0), ("class_3", 5.0)]));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].name, HEALTHY_NAME);
    }

    #[test]
    fn just_above_trigger_is_moderate() {
        let findings = classify(&dist(&[("class_1", 5.01)]));
        assert_eq!(findings[0].name, "Caries (Tooth Decay)");
        assert_eq!(findings[0].severity, Severity::Moderate);
    }

    #[test]
    fn fifteen_is_moderate_sixteen_is_high() {
        assert_eq!(classify(&dist(&[("class_1", 15.0)]))[0].severity, Severity::Moderate);
        assert_eq!(classify(&dist(&[("class_1", 16.0)]))[0].severity, Severity::High);
    }

    #[test]
    fn multiple_findings_follow_rule_order() {
        let findings = classify(&dist(&[("class_3", 30.0), ("class_1", 6.0), ("class_2", 12.0)]));
        let names: Vec<&str> = findings.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Caries (Tooth Decay)",
                "Gingivitis (Gum Inflammation)",
                "Plaque/Tartar Buildup"
            ]
        );
        assert_eq!(findings[2].severity, Severity::High);
    }

    #[test]
    fn empty_distribution_is_healthy_at_full_confidence() {
        let findings = classify(&ClassDistribution::new());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].confidence_percent, 100.0);
    }

    #[test]
    fn custom_thresholds_apply() {
        let thresholds = Thresholds {
            trigger: 10.0,
            high: 12.0,
        };
        let findings = classify_with(&dist(&[("class_2", 9.0), ("class_3", 13.0)]), &thresholds);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].name, "Plaque/Tartar Buildup");
        assert_eq!(findings[0].severity, Severity::High);
    }

    #[test]
    fn unknown_classes_ignored() {
        let findings = classify(&dist(&[("class_9", 80.0), ("background", 20.0)]));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].name, HEALTHY_NAME);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::models::ClassShare;
    use proptest::prelude::*;

    fn build(pcts: &[f64; 3], background: f64, rotate: usize) -> ClassDistribution {
        let mut entries = vec![
            ("class_1", pcts[0]),
            ("class_2", pcts[1]),
            ("class_3", pcts[2]),
            ("background", background),
        ];
        entries.rotate_left(rotate % 4);
        entries
            .into_iter()
            .map(|(k, p)| (k, ClassShare::from_percentage(p)))
            .collect()
    }

    proptest! {
        /// Property: all conditions at or below 5% yield exactly one healthy finding
        #[test]
        fn all_below_trigger_is_healthy(
            a in 0.0f64..=5.0, b in 0.0f64..=5.0, c in 0.0f64..=5.0, bg in 0.0f64..=100.0
        ) {
            let findings = classify(&build(&[a, b, c], bg, 0));
            prop_assert_eq!(findings.len(), 1);
            prop_assert_eq!(findings[0].name.as_str(), HEALTHY_NAME);
            prop_assert_eq!(findings[0].severity, Severity::None);
            prop_assert_eq!(findings[0].confidence_percent, bg);
        }

        /// Property: key order of the input never changes the output
        #[test]
        fn order_independent(
            a in 0.0f64..=100.0, b in 0.0f64..=100.0, c in 0.0f64..=100.0,
            bg in 0.0f64..=100.0, rotate in 0usize..4
        ) {
            let reference = classify(&build(&[a, b, c], bg, 0));
            let rotated = classify(&build(&[a, b, c], bg, rotate));
            prop_assert_eq!(&reference, &rotated);
            prop_assert_eq!(&reference, &classify(&build(&[a, b, c], bg, 0)));
        }

        /// Property: output is never empty and never exceeds rules + fallback
        #[test]
        fn bounded_non_empty(a in 0.0f64..=100.0, b in 0.0f64..=100.0, c in 0.0f64..=100.0) {
            let findings = classify(&build(&[a, b, c], 0.0, 0));
            prop_assert!(!findings.is_empty());
            prop_assert!(findings.len() <= CONDITION_RULES.len());
        }

        /// Property: triggered findings carry the class percentage as confidence
        #[test]
        fn severity_tracks_percentage(p in 5.0001f64..=100.0) {
            let findings = classify(&build(&[p, 0.0, 0.0], 0.0, 0));
            prop_assert_eq!(findings.len(), 1);
            prop_assert_eq!(findings[0].confidence_percent, p);
            let expected = if p > 15.0 { Severity::High } else { Severity::Moderate };
            prop_assert_eq!(findings[0].severity, expected);
        }
    }
}
