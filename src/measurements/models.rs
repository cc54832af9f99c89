//! Planned extra measurements (a test reference plus its parameters)
//!
//! Measurement lists are stored on actions and samplings in the legacy
//! `testId#param1#param2,testId#param1,...` encoding. Reports and the data
//! entry screens parse that string, so the format must stay stable.

use crate::common::codecs::parse_int_or_zero;
use serde::{Deserialize, Serialize};

/// A reference to a test plus the parameters it should be performed with.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurement {
    pub test_id: i32,
    pub parameters: Vec<String>,
}

impl Measurement {
    pub fn new(test_id: i32, parameters: &[&str]) -> Self {
        Measurement {
            test_id,
            parameters: parameters.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Decode a serialized measurement list. Malformed test ids decode to 0;
/// empty tokens are skipped.
pub fn decode_measurements(s: &str) -> Vec<Measurement> {
    s.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| {
            let mut fields = token.split('#');
            let test_id = parse_int_or_zero(fields.next().unwrap_or(""));
            Measurement {
                test_id,
                parameters: fields.map(ToString::to_string).collect(),
            }
        })
        .collect()
}

/// Encode a measurement list into the `testId#param1#param2,...` wire form.
pub fn encode_measurements(measurements: &[Measurement]) -> String {
    measurements
        .iter()
        .map(|m| {
            let mut token = m.test_id.to_string();
            for parameter in &m.parameters {
                token.push('#');
                token.push_str(parameter);
            }
            token
        })
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measurement_list_round_trip() {
        let list = vec![
            Measurement::new(10, &["plasma", "4C"]),
            Measurement::new(11, &[]),
        ];
        let encoded = encode_measurements(&list);
        assert_eq!(encoded, "10#plasma#4C,11");
        assert_eq!(decode_measurements(&encoded), list);
    }

    #[test]
    fn test_decode_empty_and_malformed() {
        assert!(decode_measurements("").is_empty());
        let list = decode_measurements("x#a,12#b");
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].test_id, 0);
        assert_eq!(list[0].parameters, vec!["a".to_string()]);
        assert_eq!(list[1].test_id, 12);
    }

    #[test]
    fn test_empty_parameters_preserved() {
        let list = decode_measurements("5##x");
        assert_eq!(list[0].parameters, vec![String::new(), "x".to_string()]);
    }
}
