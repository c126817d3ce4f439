//! Operations and the edit script that orders them.
//!
//! An [`EditScript`] is produced once by the diff engine and consumed once by
//! a renderer or an applier. Its order is significant: directories appear
//! before anything inside them is created, and everything inside a directory
//! is removed before the directory itself.
//!
//! At process boundaries a script travels as a JSON array of
//! [`OperationRecord`]s (`{kind, path, value?}`), with `value` hex-encoded
//! and present only for `SET`.

use std::fmt;
use std::slice;
use std::vec;

use serde::{Deserialize, Serialize};

use crate::error::{TypeError, TypeResult};
use crate::path::TreePath;

/// The four operation kinds, named by their wire labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
    MakeDirectory,
    RemoveDirectory,
    SetValue,
    DeleteValue,
}

impl OperationKind {
    /// Wire label used in records and rendered output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::MakeDirectory => "MKDIR",
            Self::RemoveDirectory => "RMDIR",
            Self::SetValue => "SET",
            Self::DeleteValue => "DEL",
        }
    }

    /// Parse a wire label. Anything unrecognized is a contract mismatch
    /// between producer and consumer and is reported, never skipped.
    pub fn from_label(label: &str) -> TypeResult<Self> {
        match label {
            "MKDIR" => Ok(Self::MakeDirectory),
            "RMDIR" => Ok(Self::RemoveDirectory),
            "SET" => Ok(Self::SetValue),
            "DEL" => Ok(Self::DeleteValue),
            other => Err(TypeError::UnknownOperation(other.to_owned())),
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single edit against one path. No operation is recursive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    MakeDirectory(TreePath),
    RemoveDirectory(TreePath),
    SetValue(TreePath, Vec<u8>),
    DeleteValue(TreePath),
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::MakeDirectory(_) => OperationKind::MakeDirectory,
            Self::RemoveDirectory(_) => OperationKind::RemoveDirectory,
            Self::SetValue(..) => OperationKind::SetValue,
            Self::DeleteValue(_) => OperationKind::DeleteValue,
        }
    }

    pub fn path(&self) -> &TreePath {
        match self {
            Self::MakeDirectory(path)
            | Self::RemoveDirectory(path)
            | Self::SetValue(path, _)
            | Self::DeleteValue(path) => path,
        }
    }

    /// The value carried by a `SET`.
    pub fn value(&self) -> Option<&[u8]> {
        match self {
            Self::SetValue(_, value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.path())
    }
}

/// Serialized form of an [`Operation`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub kind: String,
    pub path: String,
    /// Hex-encoded value, present only for `SET`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl From<&Operation> for OperationRecord {
    fn from(op: &Operation) -> Self {
        Self {
            kind: op.kind().label().to_owned(),
            path: op.path().to_string(),
            value: op.value().map(hex::encode),
        }
    }
}

impl TryFrom<OperationRecord> for Operation {
    type Error = TypeError;

    fn try_from(record: OperationRecord) -> TypeResult<Self> {
        let kind = OperationKind::from_label(&record.kind)?;
        let path = TreePath::parse(&record.path)?;
        let invalid = |reason: String| TypeError::InvalidValue {
            path: record.path.clone(),
            reason,
        };

        match (kind, record.value.as_deref()) {
            (OperationKind::SetValue, Some(encoded)) => {
                let value = hex::decode(encoded).map_err(|e| invalid(e.to_string()))?;
                Ok(Self::SetValue(path, value))
            }
            (OperationKind::SetValue, None) => Err(invalid("missing value".into())),
            (_, Some(_)) => Err(invalid(format!("{kind} does not carry a value"))),
            (OperationKind::MakeDirectory, None) => Ok(Self::MakeDirectory(path)),
            (OperationKind::RemoveDirectory, None) => Ok(Self::RemoveDirectory(path)),
            (OperationKind::DeleteValue, None) => Ok(Self::DeleteValue(path)),
        }
    }
}

/// Per-kind operation counts for a script.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScriptStats {
    pub directories_created: usize,
    pub directories_removed: usize,
    pub values_set: usize,
    pub values_deleted: usize,
}

impl ScriptStats {
    pub fn total(&self) -> usize {
        self.directories_created + self.directories_removed + self.values_set + self.values_deleted
    }
}

impl fmt::Display for ScriptStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} mkdir, {} rmdir, {} set, {} del",
            self.directories_created, self.directories_removed, self.values_set, self.values_deleted
        )
    }
}

/// An ordered, replayable sequence of operations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EditScript {
    operations: Vec<Operation>,
}

impl EditScript {
    /// Create an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an operation.
    pub fn push(&mut self, op: Operation) {
        self.operations.push(op);
    }

    /// Returns `true` if there are no operations.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn iter(&self) -> slice::Iter<'_, Operation> {
        self.operations.iter()
    }

    /// Count operations by kind.
    pub fn stats(&self) -> ScriptStats {
        let mut stats = ScriptStats::default();
        for op in &self.operations {
            match op.kind() {
                OperationKind::MakeDirectory => stats.directories_created += 1,
                OperationKind::RemoveDirectory => stats.directories_removed += 1,
                OperationKind::SetValue => stats.values_set += 1,
                OperationKind::DeleteValue => stats.values_deleted += 1,
            }
        }
        stats
    }

    pub fn to_records(&self) -> Vec<OperationRecord> {
        self.operations.iter().map(OperationRecord::from).collect()
    }

    /// Rebuild a script from records, failing on the first invalid one.
    pub fn from_records(records: Vec<OperationRecord>) -> TypeResult<Self> {
        records
            .into_iter()
            .map(Operation::try_from)
            .collect::<TypeResult<Vec<_>>>()
            .map(|operations| Self { operations })
    }

    /// Serialize as a pretty-printed JSON array of records.
    pub fn to_json(&self) -> TypeResult<String> {
        serde_json::to_string_pretty(&self.to_records())
            .map_err(|e| TypeError::Serialization(e.to_string()))
    }

    /// Parse a JSON array of records.
    pub fn from_json(json: &str) -> TypeResult<Self> {
        let records: Vec<OperationRecord> =
            serde_json::from_str(json).map_err(|e| TypeError::Serialization(e.to_string()))?;
        Self::from_records(records)
    }
}

impl FromIterator<Operation> for EditScript {
    fn from_iter<I: IntoIterator<Item = Operation>>(iter: I) -> Self {
        Self {
            operations: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for EditScript {
    type Item = Operation;
    type IntoIter = vec::IntoIter<Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.into_iter()
    }
}

impl<'a> IntoIterator for &'a EditScript {
    type Item = &'a Operation;
    type IntoIter = slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(raw: &str) -> TreePath {
        TreePath::parse(raw).unwrap()
    }

    fn sample() -> EditScript {
        EditScript::from_iter([
            Operation::MakeDirectory(p("/d")),
            Operation::SetValue(p("/d/x"), b"hi".to_vec()),
            Operation::DeleteValue(p("/old")),
            Operation::RemoveDirectory(p("/gone")),
        ])
    }

    #[test]
    fn labels_match_wire_format() {
        assert_eq!(OperationKind::MakeDirectory.label(), "MKDIR");
        assert_eq!(OperationKind::RemoveDirectory.label(), "RMDIR");
        assert_eq!(OperationKind::SetValue.label(), "SET");
        assert_eq!(OperationKind::DeleteValue.label(), "DEL");
    }

    #[test]
    fn unknown_label_is_an_error() {
        assert_eq!(
            OperationKind::from_label("RENAME"),
            Err(TypeError::UnknownOperation("RENAME".into()))
        );
    }

    #[test]
    fn only_set_carries_a_value() {
        let script = sample();
        let values: Vec<_> = script.iter().map(Operation::value).collect();
        assert_eq!(values, vec![None, Some(&b"hi"[..]), None, None]);
    }

    #[test]
    fn records_hex_encode_values() {
        let records = sample().to_records();
        assert_eq!(records[0].kind, "MKDIR");
        assert_eq!(records[0].value, None);
        assert_eq!(records[1].path, "/d/x");
        assert_eq!(records[1].value.as_deref(), Some("6869"));
    }

    #[test]
    fn json_roundtrip_preserves_order() {
        let script = sample();
        let json = script.to_json().unwrap();
        assert!(!json.contains("\"value\": null"));
        assert_eq!(EditScript::from_json(&json).unwrap(), script);
    }

    #[test]
    fn unknown_kind_in_json_is_rejected() {
        let json = r#"[{"kind":"MKDIR","path":"/a"},{"kind":"CHMOD","path":"/a"}]"#;
        assert_eq!(
            EditScript::from_json(json),
            Err(TypeError::UnknownOperation("CHMOD".into()))
        );
    }

    #[test]
    fn set_without_value_is_rejected() {
        let json = r#"[{"kind":"SET","path":"/a"}]"#;
        assert!(matches!(
            EditScript::from_json(json),
            Err(TypeError::InvalidValue { .. })
        ));
    }

    #[test]
    fn value_on_non_set_is_rejected() {
        let json = r#"[{"kind":"DEL","path":"/a","value":"00"}]"#;
        assert!(matches!(
            EditScript::from_json(json),
            Err(TypeError::InvalidValue { .. })
        ));
    }

    #[test]
    fn malformed_json_is_serialization_error() {
        assert!(matches!(
            EditScript::from_json("{"),
            Err(TypeError::Serialization(_))
        ));
    }

    #[test]
    fn stats_count_each_kind() {
        let stats = sample().stats();
        assert_eq!(
            stats,
            ScriptStats {
                directories_created: 1,
                directories_removed: 1,
                values_set: 1,
                values_deleted: 1,
            }
        );
        assert_eq!(stats.total(), 4);
        assert_eq!(stats.to_string(), "1 mkdir, 1 rmdir, 1 set, 1 del");
    }

    #[test]
    fn operation_display() {
        assert_eq!(Operation::DeleteValue(p("/a/b")).to_string(), "DEL /a/b");
    }
}
