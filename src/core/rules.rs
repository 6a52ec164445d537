use crate::config::rules::RuleConfiguration;
use crate::core::normalize::{DateFormat, NumberWords};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{validate_bounds, validate_non_empty_string, validate_positive_number};
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SalaryBounds {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone)]
pub struct IdRule {
    pub required_length: Option<usize>,
    pub prefix: Option<String>,
    pub pattern: Option<Regex>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhoneRule {
    pub required_digit_count: usize,
}

/// Checked, ready-to-run form of a [`RuleConfiguration`].
///
/// Built once before the first row; read-only afterwards, so one instance can be
/// shared by every row evaluation.
#[derive(Debug, Clone)]
pub struct RuleSet {
    salary: Option<SalaryBounds>,
    date_format: Option<DateFormat>,
    id: Option<IdRule>,
    phone: Option<PhoneRule>,
    number_words: NumberWords,
}

impl RuleSet {
    pub fn compile(config: &RuleConfiguration) -> Result<Self> {
        let salary = match &config.salary_rules {
            Some(rules) => {
                validate_bounds("salary_rules", rules.min, rules.max)?;
                Some(SalaryBounds {
                    min: rules.min,
                    max: rules.max,
                })
            }
            None => None,
        };

        let date_format = config
            .date_rules
            .as_ref()
            .map(|rules| DateFormat::parse(&rules.expected_format))
            .transpose()?;

        let id = match &config.id_rules {
            Some(rules) => Some(compile_id_rule(rules)?),
            None => None,
        };

        let phone = match &config.phone_rules {
            Some(rules) => {
                validate_positive_number("phone_rules.required_digit_count", rules.required_digit_count, 1)?;
                Some(PhoneRule {
                    required_digit_count: rules.required_digit_count,
                })
            }
            None => None,
        };

        let number_words = match &config.number_words {
            Some(overrides) => NumberWords::with_overrides(overrides)?,
            None => NumberWords::default(),
        };

        let rule_set = Self {
            salary,
            date_format,
            id,
            phone,
            number_words,
        };

        tracing::debug!(
            salary = rule_set.salary.is_some(),
            date = rule_set.date_format.is_some(),
            id = rule_set.id.is_some(),
            phone = rule_set.phone.is_some(),
            number_words = rule_set.number_words.len(),
            "Rule set compiled"
        );

        Ok(rule_set)
    }

    pub fn salary_bounds(&self) -> Option<&SalaryBounds> {
        self.salary.as_ref()
    }

    pub fn date_format(&self) -> Option<&DateFormat> {
        self.date_format.as_ref()
    }

    pub fn id_rule(&self) -> Option<&IdRule> {
        self.id.as_ref()
    }

    pub fn phone_rule(&self) -> Option<&PhoneRule> {
        self.phone.as_ref()
    }

    pub fn number_words(&self) -> &NumberWords {
        &self.number_words
    }
}

fn compile_id_rule(rules: &crate::config::rules::IdRules) -> Result<IdRule> {
    if rules.required_length.is_none() && rules.prefix.is_none() && rules.pattern.is_none() {
        return Err(EtlError::MissingConfigError {
            field: "id_rules.required_length | id_rules.prefix | id_rules.pattern".to_string(),
        });
    }

    if let Some(length) = rules.required_length {
        validate_positive_number("id_rules.required_length", length, 1)?;
    }
    if let Some(prefix) = &rules.prefix {
        validate_non_empty_string("id_rules.prefix", prefix)?;
    }

    let pattern = match &rules.pattern {
        Some(pattern) => {
            // 未加錨點的樣式仍須比對整個 ID
            let anchored = format!("^(?:{})$", pattern);
            Some(Regex::new(&anchored).map_err(|e| EtlError::InvalidConfigValueError {
                field: "id_rules.pattern".to_string(),
                value: pattern.clone(),
                reason: e.to_string(),
            })?)
        }
        None => None,
    };

    Ok(IdRule {
        required_length: rules.required_length,
        prefix: rules.prefix.clone(),
        pattern,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::rules::{DateRules, IdRules, PhoneRules, SalaryRules};
    use std::collections::BTreeMap;

    #[test]
    fn test_empty_configuration_disables_every_check() {
        let rules = RuleSet::compile(&RuleConfiguration::default()).unwrap();
        assert!(rules.salary_bounds().is_none());
        assert!(rules.date_format().is_none());
        assert!(rules.id_rule().is_none());
        assert!(rules.phone_rule().is_none());
        assert_eq!(rules.number_words().lookup("seventy"), Some(70.0));
    }

    #[test]
    fn test_salary_min_above_max_fails() {
        let config = RuleConfiguration {
            salary_rules: Some(SalaryRules {
                min: 150000.0,
                max: 30000.0,
            }),
            ..Default::default()
        };
        let err = RuleSet::compile(&config).unwrap_err();
        assert!(matches!(err, EtlError::InvalidConfigValueError { ref field, .. } if field == "salary_rules"));
    }

    #[test]
    fn test_empty_date_format_fails() {
        let config = RuleConfiguration {
            date_rules: Some(DateRules {
                expected_format: "  ".to_string(),
            }),
            ..Default::default()
        };
        assert!(RuleSet::compile(&config).is_err());
    }

    #[test]
    fn test_id_rules_need_a_criterion() {
        let config = RuleConfiguration {
            id_rules: Some(IdRules::default()),
            ..Default::default()
        };
        assert!(matches!(
            RuleSet::compile(&config).unwrap_err(),
            EtlError::MissingConfigError { .. }
        ));
    }

    #[test]
    fn test_invalid_id_pattern_fails() {
        let config = RuleConfiguration {
            id_rules: Some(IdRules {
                pattern: Some("EMP[0-9".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(RuleSet::compile(&config).is_err());
    }

    #[test]
    fn test_zero_phone_digits_fails() {
        let config = RuleConfiguration {
            phone_rules: Some(PhoneRules {
                required_digit_count: 0,
            }),
            ..Default::default()
        };
        assert!(RuleSet::compile(&config).is_err());
    }

    #[test]
    fn test_full_configuration_compiles() {
        let config = RuleConfiguration {
            salary_rules: Some(SalaryRules {
                min: 30000.0,
                max: 150000.0,
            }),
            date_rules: Some(DateRules {
                expected_format: "YYYY-MM-DD".to_string(),
            }),
            id_rules: Some(IdRules {
                required_length: Some(7),
                prefix: Some("EMP".to_string()),
                pattern: Some("EMP[0-9]{4}".to_string()),
            }),
            phone_rules: Some(PhoneRules {
                required_digit_count: 7,
            }),
            number_words: Some(BTreeMap::from([("hundred".to_string(), 100.0)])),
        };

        let rules = RuleSet::compile(&config).unwrap();
        assert_eq!(rules.salary_bounds(), Some(&SalaryBounds { min: 30000.0, max: 150000.0 }));
        assert_eq!(rules.date_format().unwrap().pattern(), "YYYY-MM-DD");
        assert!(rules.id_rule().unwrap().pattern.as_ref().unwrap().is_match("EMP1234"));
        assert!(!rules.id_rule().unwrap().pattern.as_ref().unwrap().is_match("XEMP1234"));
        assert_eq!(rules.number_words().lookup("Hundred"), Some(100.0));
    }
}
