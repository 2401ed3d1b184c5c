//! Dependency selection policy for one root's resolution.
//!
//! The selector is a two-state machine walked alongside the dependency graph.
//! Each node of the walk carries a [`SelectionMode`]; the selector decides,
//! given the mode of the parent, whether an edge is accepted, which mode the
//! edge's own children are walked in, and whether the edge is fetched as its
//! source or binary variant.
//!
//! ```text
//!             same family                       any edge
//!            ┌──────────┐                     ┌──────────┐
//!            ▼          │   other artifact    ▼          │
//!        ┌───────┐──────┘ ─────────────────► ┌─────────┐─┘
//!  ────► │ Root  │                           │ Library │
//!        └───────┘                           └─────────┘
//!   accepts every edge              accepts non-optional compile edges
//! ```
//!
//! Library mode is a sink: once an edge leads outside the root's family the
//! walk never returns to root mode, even if a deeper edge points back into the
//! family.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::artifact::{Coordinate, Dependency, Scope};

/// State of the selector for the children of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionMode {
    /// Every edge is accepted and recorded as a root dependency.
    Root,
    /// Only non-optional `compile` edges are accepted.
    Library,
}

/// Whether an artifact is fetched as its `sources` classifier or as published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Source,
    Binary,
}

/// How membership of a root's multi-module family is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FamilyRule {
    /// Same group id and same artifact id as the root.
    #[default]
    Exact,
    /// Same group id, and an artifact id equal to the root's or starting with `<root>-`.
    Prefix,
}

impl FamilyRule {
    pub fn is_member(self, root: &Coordinate, candidate: &Coordinate) -> bool {
        match self {
            Self::Exact => root.same_identity(candidate),
            Self::Prefix => {
                root.group_id() == candidate.group_id()
                    && (candidate.artifact_id() == root.artifact_id()
                        || candidate
                            .artifact_id()
                            .strip_prefix(root.artifact_id())
                            .is_some_and(|rest| rest.starts_with('-')))
            }
        }
    }
}

impl FromStr for FamilyRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(Self::Exact),
            "prefix" => Ok(Self::Prefix),
            other => Err(format!("unknown family rule '{other}' (expected 'exact' or 'prefix')")),
        }
    }
}

impl fmt::Display for FamilyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Exact => "exact",
            Self::Prefix => "prefix",
        })
    }
}

/// Selection policy bound to one requested root.
///
/// A fresh selector is created for every resolution call; the record of
/// accepted root dependencies is discarded with it.
#[derive(Debug, Clone)]
pub struct DependencySelector {
    root: Coordinate,
    rule: FamilyRule,
    root_dependencies: Vec<Coordinate>,
}

impl DependencySelector {
    pub fn new(root: Coordinate, rule: FamilyRule) -> Self {
        Self {
            root,
            rule,
            root_dependencies: Vec::new(),
        }
    }

    /// Mode the root node's own dependencies are walked in.
    pub const fn initial_mode(&self) -> SelectionMode {
        SelectionMode::Root
    }

    /// Every edge accepted in root mode so far, in acceptance order.
    pub fn root_dependencies(&self) -> &[Coordinate] {
        &self.root_dependencies
    }

    pub fn is_family(&self, coordinate: &Coordinate) -> bool {
        self.rule.is_member(&self.root, coordinate)
    }

    /// Decide whether `dependency`, reached from a node walked in `mode`, is included.
    pub fn select(&mut self, mode: SelectionMode, dependency: &Dependency) -> bool {
        let selected = match mode {
            SelectionMode::Root => {
                self.root_dependencies.push(dependency.coordinate.clone());
                true
            }
            SelectionMode::Library => !dependency.optional && dependency.scope == Scope::Compile,
        };
        trace!(
            "{:?} mode {} {}",
            mode,
            if selected { "selected" } else { "pruned" },
            dependency
        );
        selected
    }

    /// Mode for the children of an accepted `dependency` reached in `mode`.
    pub fn child_mode(&self, mode: SelectionMode, dependency: &Dependency) -> SelectionMode {
        match mode {
            SelectionMode::Root if self.is_family(&dependency.coordinate) => SelectionMode::Root,
            _ => SelectionMode::Library,
        }
    }

    /// Variant an accepted `dependency` is fetched as, within a request for `requested`.
    ///
    /// Only family members reached in root mode of a source request are
    /// re-classified as sources.
    pub fn variant(&self, requested: Variant, mode: SelectionMode, dependency: &Dependency) -> Variant {
        if requested == Variant::Source && self.child_mode(mode, dependency) == SelectionMode::Root {
            Variant::Source
        } else {
            Variant::Binary
        }
    }
}
