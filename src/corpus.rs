//! JSON test-corpus loader. Grounded on `capted/tests/main.cpp`'s
//! file-driven `testEditDistance` harness, re-expressed as a `serde`-typed
//! reader instead of hand-rolled line parsing.

use serde::Deserialize;

/// One correctness case: two trees in bracket notation and the expected
/// unit-cost distance between them.
#[derive(Debug, Clone, Deserialize)]
pub struct TestCase {
    #[serde(rename = "testID")]
    pub test_id: String,
    pub t1: String,
    pub t2: String,
    pub d: f64,
}

/// One throughput case: no ground truth, used only to measure how fast the
/// engine runs over a batch of real tree pairs.
#[derive(Debug, Clone, Deserialize)]
pub struct ThroughputCase {
    #[serde(rename = "testID")]
    pub test_id: String,
    pub t1: String,
    pub t2: String,
}

/// Parses a `{testID, t1, t2, d}` JSON array.
pub fn load_test_cases(json: &str) -> serde_json::Result<Vec<TestCase>> {
    serde_json::from_str(json)
}

/// Parses a `{testID, t1, t2}` JSON array.
pub fn load_throughput_cases(json: &str) -> serde_json::Result<Vec<ThroughputCase>> {
    serde_json::from_str(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"[
        {"testID": "1", "t1": "{a}", "t2": "{a}", "d": 0.0},
        {"testID": "2", "t1": "{a}", "t2": "{b}", "d": 1.0},
        {"testID": "3", "t1": "{a{b}{c}}", "t2": "{a{c}{b}}", "d": 2.0},
        {"testID": "4", "t1": "{a{b{d}}{c}}", "t2": "{a{b}{c{d}}}", "d": 2.0},
        {"testID": "5", "t1": "{f{d{a}{c{b}}}{e}}", "t2": "{f{c{d{a}{b}}}{e}}", "d": 2.0},
        {"testID": "6", "t1": "{a}", "t2": "{a{b{c{d{e}}}}}", "d": 4.0}
    ]"#;

    #[test]
    fn test_loads_fixture_cases() {
        let cases = load_test_cases(FIXTURE).unwrap();
        assert_eq!(cases.len(), 6);
        assert_eq!(cases[0].test_id, "1");
        assert_eq!(cases[1].d, 1.0);
    }

    #[test]
    fn test_fixture_agrees_with_engine() {
        use crate::apted::Apted;
        use crate::cost::UnitCostModel;
        use crate::indexing::AptedIndex;
        use crate::parsing::{parse_tree, LabelDict};

        for case in load_test_cases(FIXTURE).unwrap() {
            let mut ld = LabelDict::new();
            let t1 = parse_tree(&case.t1, &mut ld).unwrap();
            let t2 = parse_tree(&case.t2, &mut ld).unwrap();
            let idx1 = AptedIndex::build(&t1, &UnitCostModel).unwrap();
            let idx2 = AptedIndex::build(&t2, &UnitCostModel).unwrap();
            let mut apted = Apted::new(&UnitCostModel);
            assert_eq!(apted.compute_edit_distance(&idx1, &idx2), case.d, "case {}", case.test_id);
        }
    }

    #[test]
    fn test_loads_throughput_cases_without_ground_truth() {
        let json = r#"[{"testID": "t1", "t1": "{a}", "t2": "{b}"}]"#;
        let cases = load_throughput_cases(json).unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].test_id, "t1");
    }
}
