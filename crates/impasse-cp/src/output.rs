//! Reading solver output back into per-solution component values.

use std::fmt;

use impasse_ir::Cipher;
use indexmap::{IndexMap, IndexSet};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::incompatibility::extract_incompatibilities;
use crate::terms::INVERSE_MARKER;

/// Line printed by the solver between two solutions.
pub const SOLUTION_SEPARATOR: &str = "----------";
const UNSATISFIABLE_MARKER: &str = "=====UNSATISFIABLE=====";
const UNKNOWN_MARKER: &str = "=====UNKNOWN=====";
const STAT_PREFIX: &str = "%%%mzn-stat:";

/// The kind of search a model was built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    DeterministicTruncatedXorDifferential,
    DeterministicTruncatedXorDifferentialOneSolution,
    ImpossibleXorDifferential,
    ImpossibleXorDifferentialOneSolution,
}

impl ModelType {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelType::DeterministicTruncatedXorDifferential => {
                "deterministic_truncated_xor_differential"
            }
            ModelType::DeterministicTruncatedXorDifferentialOneSolution => {
                "deterministic_truncated_xor_differential_one_solution"
            }
            ModelType::ImpossibleXorDifferential => "impossible_xor_differential",
            ModelType::ImpossibleXorDifferentialOneSolution => {
                "impossible_xor_differential_one_solution"
            }
        }
    }

    pub fn is_impossible(self) -> bool {
        self.as_str().contains("impossible")
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reported component value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentValue {
    /// Compact truncated word, e.g. `"2221"`.
    pub value: String,
    pub weight: u32,
}

impl ComponentValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            weight: 0,
        }
    }
}

/// Values of one solution, keyed by printed identifier in roster order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Solution {
    pub values: IndexMap<String, ComponentValue>,
}

impl Solution {
    pub fn get(&self, id: &str) -> Option<&ComponentValue> {
        self.values.get(id)
    }

    pub fn insert(&mut self, id: impl Into<String>, value: ComponentValue) {
        self.values.insert(id.into(), value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

/// Solutions in the order the solver reported them; bucket `n` is
/// serialised under the key `solution{n + 1}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolutionRecord {
    pub solutions: Vec<Solution>,
}

impl SolutionRecord {
    pub fn single(solution: Solution) -> Self {
        Self {
            solutions: vec![solution],
        }
    }

    /// Look up a bucket by its 1-based solution number.
    pub fn solution(&self, number: usize) -> Option<&Solution> {
        number.checked_sub(1).and_then(|i| self.solutions.get(i))
    }

    pub fn bucket_count(&self) -> usize {
        self.solutions.len()
    }

    pub fn non_empty_count(&self) -> usize {
        self.solutions.iter().filter(|s| !s.is_empty()).count()
    }
}

impl Serialize for SolutionRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.solutions.len()))?;
        for (i, solution) in self.solutions.iter().enumerate() {
            map.serialize_entry(&format!("solution{}", i + 1), solution)?;
        }
        map.end()
    }
}

/// Elapsed time and memory reported by the solver; `-1` when absent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverStatistics {
    pub solving_time_seconds: f64,
    pub memory_megabytes: f64,
}

impl Default for SolverStatistics {
    fn default() -> Self {
        Self {
            solving_time_seconds: -1.0,
            memory_megabytes: -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    Satisfiable,
    Unsatisfiable,
    Unknown,
}

/// Identifiers the interpreter looks for, with the role of each input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    ids: IndexSet<String>,
    cipher_inputs: IndexSet<String>,
    inverse_inputs: IndexSet<String>,
}

impl Roster {
    /// Cipher inputs, then forward ids, then marked backward ids, then
    /// inverse-cipher inputs. Duplicates keep their first position.
    pub fn new<'a>(
        cipher_inputs: impl IntoIterator<Item = &'a str>,
        forward_ids: impl IntoIterator<Item = &'a str>,
        backward_ids: impl IntoIterator<Item = &'a str>,
        inverse_inputs: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let cipher_inputs: IndexSet<String> =
            cipher_inputs.into_iter().map(str::to_string).collect();
        let inverse_inputs: IndexSet<String> =
            inverse_inputs.into_iter().map(str::to_string).collect();
        let mut ids = cipher_inputs.clone();
        ids.extend(forward_ids.into_iter().map(str::to_string));
        ids.extend(
            backward_ids
                .into_iter()
                .map(|id| format!("{INVERSE_MARKER}{id}")),
        );
        ids.extend(inverse_inputs.iter().cloned());
        Self {
            ids,
            cipher_inputs,
            inverse_inputs,
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Role a printed name plays for roster entry `id`, in priority order.
    pub fn classify(&self, lhs: &str, id: &str) -> Option<LineRole> {
        let marked = format!("{INVERSE_MARKER}{id}");
        if lhs == id && self.cipher_inputs.contains(id) {
            Some(LineRole::CipherInput)
        } else if lhs == marked && self.inverse_inputs.contains(id) {
            Some(LineRole::InverseInput)
        } else if lhs.strip_prefix(id) == Some("_i") {
            Some(LineRole::SubInput)
        } else if lhs.strip_prefix(id) == Some("_o") {
            Some(LineRole::SubOutput)
        } else if lhs == marked {
            Some(LineRole::InverseCounterpart)
        } else if lhs == id {
            Some(LineRole::Component)
        } else {
            None
        }
    }
}

/// What a matched output line carries for its roster entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRole {
    CipherInput,
    InverseInput,
    SubInput,
    SubOutput,
    InverseCounterpart,
    Component,
}

impl LineRole {
    /// Key the value is filed under.
    pub fn key(self, id: &str) -> String {
        match self {
            LineRole::CipherInput | LineRole::Component => id.to_string(),
            LineRole::InverseInput | LineRole::InverseCounterpart => {
                format!("{INVERSE_MARKER}{id}")
            }
            LineRole::SubInput => format!("{id}_i"),
            LineRole::SubOutput => format!("{id}_o"),
        }
    }
}

/// Everything recovered from one solver run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interpretation {
    pub model_type: ModelType,
    pub status: SolveStatus,
    pub statistics: SolverStatistics,
    pub record: SolutionRecord,
    /// Set when `record` was reduced to incompatibility evidence.
    pub extracted: bool,
}

fn is_separator(line: &str) -> bool {
    line.trim() == SOLUTION_SEPARATOR
}

/// Split `name = value` into the name and the compacted value.
fn split_value_line(line: &str) -> Option<(&str, String)> {
    let (lhs, rhs) = line.split_once('=')?;
    let lhs = lhs.trim();
    if lhs.is_empty() || lhs.contains(char::is_whitespace) {
        return None;
    }
    let value: String = rhs
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | ',' | '=') && !c.is_whitespace())
        .collect();
    Some((lhs, value))
}

/// Group value lines into solution buckets. `k` separators always give
/// `k + 1` buckets.
pub fn collect_solutions<S: AsRef<str>>(lines: &[S], roster: &Roster) -> SolutionRecord {
    let separators = lines.iter().filter(|l| is_separator(l.as_ref())).count();
    let mut solutions = vec![Solution::default(); separators + 1];

    for id in roster.ids() {
        let mut current = 0usize;
        for line in lines {
            let line = line.as_ref();
            if is_separator(line) {
                current += 1;
                continue;
            }
            let Some((lhs, value)) = split_value_line(line) else {
                continue;
            };
            if let Some(role) = roster.classify(lhs, id) {
                solutions[current].insert(role.key(id), ComponentValue::new(value));
            }
        }
    }

    SolutionRecord { solutions }
}

fn stat_value(line: &str, keys: &[&str]) -> Option<f64> {
    let body = line.trim().strip_prefix(STAT_PREFIX)?.trim();
    let (key, value) = body.split_once('=')?;
    if keys.contains(&key.trim()) {
        value.trim().parse().ok()
    } else {
        None
    }
}

/// Time and memory statistics; the last reported value wins.
pub fn parse_statistics<S: AsRef<str>>(lines: &[S]) -> SolverStatistics {
    let mut stats = SolverStatistics::default();
    for line in lines {
        let line = line.as_ref();
        if let Some(time) = stat_value(line, &["solveTime", "time"]) {
            stats.solving_time_seconds = time;
        }
        if let Some(mem) = stat_value(line, &["peakMem", "trailMem"]) {
            stats.memory_megabytes = mem;
        }
    }
    stats
}

pub fn parse_status<S: AsRef<str>>(lines: &[S]) -> SolveStatus {
    let mut status = SolveStatus::Unknown;
    for line in lines {
        match line.as_ref().trim() {
            UNSATISFIABLE_MARKER => return SolveStatus::Unsatisfiable,
            UNKNOWN_MARKER => return SolveStatus::Unknown,
            SOLUTION_SEPARATOR => status = SolveStatus::Satisfiable,
            _ => {}
        }
    }
    status
}

/// Interpret a full solver run. For impossible-differential searches with
/// more than one bucket, the record is reduced to the incompatibility
/// evidence found in the first solution.
pub fn parse_solver_output<S: AsRef<str>>(
    lines: &[S],
    roster: &Roster,
    model_type: ModelType,
    cipher: &Cipher,
) -> Interpretation {
    let mut record = collect_solutions(lines, roster);
    let mut extracted = false;
    if model_type.is_impossible() && record.bucket_count() > 1 {
        if let Some(first) = record.solutions.first() {
            record = extract_incompatibilities(first, cipher);
            extracted = true;
        }
    }
    tracing::debug!(
        model_type = model_type.as_str(),
        buckets = record.bucket_count(),
        extracted,
        "interpreted solver output"
    );

    Interpretation {
        model_type,
        status: parse_status(lines),
        statistics: parse_statistics(lines),
        record,
        extracted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use impasse_ir::{CipherInput, Component, ComponentKind, WordOperation};

    fn one_xor_cipher() -> Cipher {
        let mut cipher = Cipher::new(
            "one_xor",
            vec![CipherInput::new("plaintext", 4), CipherInput::new("key", 4)],
        );
        cipher.add_round(vec![Component::new(
            "xor_0_0",
            ComponentKind::word(WordOperation::Xor),
            4,
        )
        .with_input("plaintext", 0..4)
        .with_input("key", 0..4)]);
        cipher
    }

    fn one_xor_roster() -> Roster {
        Roster::new(
            ["plaintext", "key"],
            ["xor_0_0"],
            ["xor_0_0"],
            ["xor_0_0", "key"],
        )
    }

    #[test]
    fn single_xor_solution_is_recovered_verbatim() {
        let lines = [
            "plaintext = [1,1,1,1]",
            "key = [0,0,0,0]",
            "inverse_xor_0_0 = [2,2,2,1]",
            "----------",
        ];
        let interpretation = parse_solver_output(
            &lines,
            &one_xor_roster(),
            ModelType::DeterministicTruncatedXorDifferential,
            &one_xor_cipher(),
        );
        let record = &interpretation.record;
        assert_eq!(record.bucket_count(), 2);

        let first = record.solution(1).unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(first.get("plaintext"), Some(&ComponentValue::new("1111")));
        assert_eq!(first.get("key"), Some(&ComponentValue::new("0000")));
        assert_eq!(
            first.get("inverse_xor_0_0"),
            Some(&ComponentValue::new("2221"))
        );
        assert!(record.solution(2).unwrap().is_empty());
        assert_eq!(interpretation.status, SolveStatus::Satisfiable);
        assert!(!interpretation.extracted);
    }

    #[test]
    fn separators_define_bucket_count() {
        let roster = one_xor_roster();
        let trailing = ["key = [0,0,0,0]", "----------", "key = [1,0,0,0]", "----------"];
        let record = collect_solutions(&trailing, &roster);
        assert_eq!(record.bucket_count(), 3);
        assert_eq!(record.non_empty_count(), 2);

        let open_ended = ["key = [0,0,0,0]", "----------", "key = [1,0,0,0]"];
        let record = collect_solutions(&open_ended, &roster);
        assert_eq!(record.bucket_count(), 2);
        assert_eq!(record.non_empty_count(), 2);
        assert_eq!(
            record.solution(2).unwrap().get("key").unwrap().value,
            "1000"
        );
    }

    #[test]
    fn classification_follows_priority() {
        let roster = one_xor_roster();
        assert_eq!(roster.classify("key", "key"), Some(LineRole::CipherInput));
        assert_eq!(
            roster.classify("inverse_key", "key"),
            Some(LineRole::InverseInput)
        );
        assert_eq!(roster.classify("xor_0_0_i", "xor_0_0"), Some(LineRole::SubInput));
        assert_eq!(roster.classify("xor_0_0_o", "xor_0_0"), Some(LineRole::SubOutput));
        assert_eq!(
            roster.classify("inverse_xor_0_0", "inverse_xor_0_0"),
            Some(LineRole::Component)
        );
        assert_eq!(roster.classify("xor_0_01", "xor_0_0"), None);
        assert_eq!(roster.classify("keyboard", "key"), None);
    }

    #[test]
    fn prefix_sharing_ids_do_not_overwrite_each_other() {
        let none: [&str; 0] = [];
        let roster = Roster::new(["plaintext"], ["xor_0_1", "xor_0_10"], none, none);
        let lines = ["xor_0_1 = [0,0]", "xor_0_10 = [1,1]"];
        let record = collect_solutions(&lines, &roster);
        let first = record.solution(1).unwrap();
        assert_eq!(first.get("xor_0_1").unwrap().value, "00");
        assert_eq!(first.get("xor_0_10").unwrap().value, "11");
    }

    #[test]
    fn statistics_default_to_minus_one() {
        let lines = ["%%%mzn-stat: solveTime=0.25", "----------"];
        let stats = parse_statistics(&lines);
        assert_eq!(stats.solving_time_seconds, 0.25);
        assert_eq!(stats.memory_megabytes, -1.0);

        let lines = ["%%%mzn-stat: peakMem=1.5", "=====UNSATISFIABLE====="];
        assert_eq!(parse_statistics(&lines).memory_megabytes, 1.5);
        assert_eq!(parse_status(&lines), SolveStatus::Unsatisfiable);
        assert_eq!(parse_status::<&str>(&[]), SolveStatus::Unknown);
    }

    #[test]
    fn record_serialises_with_solution_keys() {
        let mut solution = Solution::default();
        solution.insert("plaintext", ComponentValue::new("1111"));
        let record = SolutionRecord {
            solutions: vec![solution, Solution::default()],
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "solution1": {"plaintext": {"value": "1111", "weight": 0}},
                "solution2": {}
            })
        );
    }

    #[test]
    fn model_types_name_their_search() {
        assert!(ModelType::ImpossibleXorDifferential.is_impossible());
        assert!(ModelType::ImpossibleXorDifferentialOneSolution.is_impossible());
        assert!(!ModelType::DeterministicTruncatedXorDifferential.is_impossible());
        assert_eq!(
            serde_json::to_value(ModelType::ImpossibleXorDifferentialOneSolution).unwrap(),
            serde_json::json!("impossible_xor_differential_one_solution")
        );
    }
}
