use super::{CodeType, Detection, Platform};

/// Known decoder misclassifications, one per platform family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    /// EAN-13 with a forced leading zero is really UPC-A; the ios decoder
    /// never reports UPC-A on its own.
    LeadingZeroEan13AsUpcA,
    /// The android decoder does not tell ITF-14 apart from generic
    /// interleaved 2 of 5.
    FourteenCharItfAsItf14,
}

impl Rule {
    fn apply(self, code_type: &CodeType, value: &str) -> Option<(CodeType, String)> {
        match self {
            Rule::LeadingZeroEan13AsUpcA => {
                if *code_type == CodeType::Ean13
                    && value.len() == 13
                    && value.bytes().all(|b| b.is_ascii_digit())
                    && value.starts_with('0')
                {
                    Some((CodeType::UpcA, value[1..].to_string()))
                } else {
                    None
                }
            }
            Rule::FourteenCharItfAsItf14 => {
                if *code_type == CodeType::Itf && value.chars().count() == 14 {
                    Some((CodeType::Itf14, value.to_string()))
                } else {
                    None
                }
            }
        }
    }
}

fn rules_for(platform: Platform) -> &'static [Rule] {
    match platform {
        Platform::Ios => &[Rule::LeadingZeroEan13AsUpcA],
        Platform::Android => &[Rule::FourteenCharItfAsItf14],
    }
}

/// Rewrites a detection's declared type and value before validation.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    platform: Platform,
    rules: &'static [Rule],
}

impl Normalizer {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            rules: rules_for(platform),
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Returns the corrected detection. Detections without a value pass
    /// through untouched; the first matching rule wins.
    pub fn normalize(&self, detection: Detection) -> Detection {
        let Some(value) = detection.value.as_deref() else {
            return detection;
        };

        for rule in self.rules {
            if let Some((code_type, value)) = rule.apply(&detection.code_type, value) {
                return Detection {
                    code_type,
                    value: Some(value),
                };
            }
        }

        detection
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(Platform::current())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    fn detect(code_type: CodeType, value: &str) -> Detection {
        Detection::new(code_type, value)
    }

    #[test]
    fn test_ios_leading_zero_ean13_becomes_upca() {
        let normalizer = Normalizer::new(Platform::Ios);
        let out = normalizer.normalize(detect(CodeType::Ean13, "0012345678905"));
        assert_eq!(out, detect(CodeType::UpcA, "012345678905"));
    }

    #[test]
    fn test_android_fourteen_char_itf_becomes_itf14() {
        let normalizer = Normalizer::new(Platform::Android);
        let out = normalizer.normalize(detect(CodeType::Itf, "00012345678905"));
        assert_eq!(out, detect(CodeType::Itf14, "00012345678905"));
    }

    #[test_case(Platform::Android, CodeType::Ean13, "0012345678905" ; "upca rule is ios only")]
    #[test_case(Platform::Ios, CodeType::Itf, "00012345678905" ; "itf14 rule is android only")]
    #[test_case(Platform::Ios, CodeType::Ean13, "4006381333931" ; "ean13 without leading zero")]
    #[test_case(Platform::Ios, CodeType::Ean13, "001234567890" ; "ean13 too short")]
    #[test_case(Platform::Ios, CodeType::Ean13, "0A12345678905" ; "ean13 with letters")]
    #[test_case(Platform::Android, CodeType::Itf, "1234567890" ; "itf not fourteen")]
    #[test_case(Platform::Android, CodeType::Qr, "00012345678905" ; "other types untouched")]
    fn test_normalize_leaves_detection_unchanged(
        platform: Platform,
        code_type: CodeType,
        value: &str,
    ) {
        let input = detect(code_type, value);
        assert_eq!(Normalizer::new(platform).normalize(input.clone()), input);
    }

    #[test]
    fn test_absent_value_passes_through() {
        let input = Detection {
            code_type: CodeType::Ean13,
            value: None,
        };
        for platform in [Platform::Ios, Platform::Android] {
            assert_eq!(Normalizer::new(platform).normalize(input.clone()), input);
        }
    }

    fn any_code_type() -> impl Strategy<Value = CodeType> {
        prop_oneof![
            Just(CodeType::Ean13),
            Just(CodeType::UpcA),
            Just(CodeType::Itf),
            Just(CodeType::Itf14),
            Just(CodeType::Qr),
            Just(CodeType::Unknown),
        ]
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(
            code_type in any_code_type(),
            value in prop_oneof!["0[0-9]{12}", "[0-9]{14}", ".{0,20}"],
            ios in any::<bool>(),
        ) {
            let platform = if ios { Platform::Ios } else { Platform::Android };
            let normalizer = Normalizer::new(platform);
            let once = normalizer.normalize(Detection::new(code_type, value));
            let twice = normalizer.normalize(once.clone());
            prop_assert_eq!(once, twice);
        }
    }
}
