//! Identifying documents within the STAC corpus layout.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Annotation stage a document belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, clap::ValueEnum)]
pub enum Stage {
    Unannotated,
    Units,
    Discourse,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Unannotated, Stage::Units, Stage::Discourse];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unannotated => "unannotated",
            Self::Units => "units",
            Self::Discourse => "discourse",
        }
    }

    /// Whether documents in this stage live under an annotator directory.
    pub fn has_annotator(&self) -> bool {
        !matches!(self, Self::Unannotated)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unannotated" => Ok(Self::Unannotated),
            "units" => Ok(Self::Units),
            "discourse" => Ok(Self::Discourse),
            other => Err(format!("unknown stage '{}'", other)),
        }
    }
}

/// Key of one annotation file in the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId {
    pub doc: String,
    pub subdoc: String,
    pub stage: Stage,
    pub annotator: Option<String>,
}

impl FileId {
    pub fn new(
        doc: impl Into<String>,
        subdoc: impl Into<String>,
        stage: Stage,
        annotator: Option<String>,
    ) -> Self {
        Self {
            doc: doc.into(),
            subdoc: subdoc.into(),
            stage,
            annotator,
        }
    }

    /// The same document in another stage/annotator slot.
    pub fn with_stage(&self, stage: Stage, annotator: Option<String>) -> Self {
        Self {
            stage,
            annotator,
            ..self.clone()
        }
    }

    /// `<doc>_<subdoc>`, the shared file stem of a document's files.
    pub fn stem(&self) -> String {
        format!("{}_{}", self.doc, self.subdoc)
    }

    fn stage_dir(&self, root: &Path) -> PathBuf {
        let dir = root.join(&self.doc).join(self.stage.as_str());
        match (&self.annotator, self.stage.has_annotator()) {
            (Some(annotator), true) => dir.join(annotator),
            _ => dir,
        }
    }

    /// Path of the `.aa` annotation file under `root`.
    pub fn annotation_path(&self, root: &Path) -> PathBuf {
        self.stage_dir(root).join(format!("{}.aa", self.stem()))
    }

    /// Path of the `.ac` text file under `root`; shared by every stage.
    pub fn text_path(&self, root: &Path) -> PathBuf {
        root.join(&self.doc)
            .join(Stage::Unannotated.as_str())
            .join(format!("{}.ac", self.stem()))
    }

    /// Recover the subdocument name from a file stem of `doc`.
    pub fn subdoc_from_stem<'a>(doc: &str, stem: &'a str) -> Option<&'a str> {
        stem.strip_prefix(doc)?.strip_prefix('_')
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.doc, self.subdoc, self.stage)?;
        if let Some(annotator) = &self.annotator {
            write!(f, " {}", annotator)?;
        }
        Ok(())
    }
}
