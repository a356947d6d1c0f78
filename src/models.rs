//! Core data models used throughout the crawler.
//!
//! These types describe where the walk currently is in the administrative
//! hierarchy ([`Level`], [`SelectionPath`]), what the oracle offers at each
//! step ([`LevelOption`]), and what ends up in the sink ([`LeafRecord`]).

use std::fmt;

/// One level of the option tree below a state, from broadest to narrowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Level {
    District,
    Village,
    Ward,
    RegCentre,
}

impl Level {
    /// All levels in traversal order.
    pub const ALL: [Level; 4] = [
        Level::District,
        Level::Village,
        Level::Ward,
        Level::RegCentre,
    ];

    /// Position of this level in [`Level::ALL`].
    pub fn depth(self) -> usize {
        match self {
            Level::District => 0,
            Level::Village => 1,
            Level::Ward => 2,
            Level::RegCentre => 3,
        }
    }

    /// The `list_type` discriminator the options endpoint expects.
    pub fn list_type(self) -> &'static str {
        match self {
            Level::District => "district",
            Level::Village => "vdc",
            Level::Ward => "ward",
            Level::RegCentre => "reg_centre",
        }
    }

    /// Human label used in log lines and record rendering.
    pub fn display_name(self) -> &'static str {
        match self {
            Level::District => "District",
            Level::Village => "VDC",
            Level::Ward => "Ward",
            Level::RegCentre => "Reg Centre",
        }
    }

    /// Whether siblings at this level are handed to the worker pool.
    /// District and village iteration is always sequential.
    pub fn fans_out(self) -> bool {
        matches!(self, Level::Ward | Level::RegCentre)
    }

    /// The level below this one, if any.
    pub fn child(self) -> Option<Level> {
        Level::ALL.get(self.depth() + 1).copied()
    }

    /// Parse the CLI spelling of a level (`district`, `vdc`, `ward`, `reg-centre`).
    pub fn parse(s: &str) -> Option<Level> {
        match s {
            "district" => Some(Level::District),
            "vdc" | "village" => Some(Level::Village),
            "ward" => Some(Level::Ward),
            "reg-centre" | "reg_centre" => Some(Level::RegCentre),
            _ => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.list_type())
    }
}

/// A `(code, label)` pair offered by the oracle for one level.
///
/// Codes are opaque identifiers; nothing assumes they are numeric or
/// unique within a response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LevelOption {
    pub code: String,
    pub label: String,
}

impl LevelOption {
    pub fn new(code: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            label: label.into(),
        }
    }
}

/// The selections made so far, starting at a state.
///
/// `steps[i]` is the option chosen at `Level::ALL[i]`. The only way to
/// extend a path is [`SelectionPath::child`], so a level is only ever set
/// when every shallower level is set too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionPath {
    state: String,
    steps: Vec<LevelOption>,
}

impl SelectionPath {
    /// A path that has only chosen a state.
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            steps: Vec::with_capacity(Level::ALL.len()),
        }
    }

    /// Build a path from raw codes, e.g. from CLI flags. Labels are left
    /// empty. Stops at the first missing code so the prefix rule holds.
    pub fn from_codes(state: impl Into<String>, codes: &[Option<&str>]) -> Self {
        let mut path = Self::new(state);
        for code in codes.iter().take(Level::ALL.len()) {
            match code {
                Some(code) => path.steps.push(LevelOption::new(*code, "")),
                None => break,
            }
        }
        path
    }

    /// Extend the path with the option chosen at [`next_level`](Self::next_level).
    pub fn child(&self, option: LevelOption) -> Self {
        debug_assert!(self.steps.len() < Level::ALL.len(), "path already complete");
        let mut steps = self.steps.clone();
        steps.push(option);
        Self {
            state: self.state.clone(),
            steps,
        }
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    /// The option chosen at `level`, if the path reaches that deep.
    pub fn selection(&self, level: Level) -> Option<&LevelOption> {
        self.steps.get(level.depth())
    }

    /// The code chosen at `level`, if the path reaches that deep.
    pub fn code(&self, level: Level) -> Option<&str> {
        self.selection(level).map(|o| o.code.as_str())
    }

    /// The deepest level selected so far, or `None` for a bare state.
    pub fn deepest(&self) -> Option<Level> {
        self.steps.len().checked_sub(1).map(|i| Level::ALL[i])
    }

    /// The level that has to be resolved next, or `None` for a leaf.
    pub fn next_level(&self) -> Option<Level> {
        Level::ALL.get(self.steps.len()).copied()
    }

    pub fn is_leaf(&self) -> bool {
        self.next_level().is_none()
    }
}

impl fmt::Display for SelectionPath {
    /// `State: 1, District: 12, VDC: 5`: only the levels that are set.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "State: {}", self.state)?;
        for (level, step) in Level::ALL.iter().zip(&self.steps) {
            write!(f, ", {}: {}", level.display_name(), step.code)?;
        }
        Ok(())
    }
}

/// A registration centre whose voter list link was found.
///
/// Created once per successful leaf lookup and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafRecord {
    pub state: String,
    pub district: LevelOption,
    pub village: LevelOption,
    pub ward: LevelOption,
    pub reg_centre: LevelOption,
    pub link: String,
}

impl LeafRecord {
    /// Pair a complete path with its link. Returns `None` when the path
    /// does not reach the registration-centre level.
    pub fn from_path(path: &SelectionPath, link: impl Into<String>) -> Option<Self> {
        Some(Self {
            state: path.state().to_string(),
            district: path.selection(Level::District)?.clone(),
            village: path.selection(Level::Village)?.clone(),
            ward: path.selection(Level::Ward)?.clone(),
            reg_centre: path.selection(Level::RegCentre)?.clone(),
            link: link.into(),
        })
    }

    /// The single output line for this record, without a trailing newline.
    pub fn to_line(&self) -> String {
        format!(
            "State: {} District: {} ({}), VDC: {} ({}), Ward: {} ({}), Reg Centre: {} ({}), Link: {}",
            self.state,
            self.district.code,
            self.district.label,
            self.village.code,
            self.village.label,
            self.ward.code,
            self.ward.label,
            self.reg_centre.code,
            self.reg_centre.label,
            self.link
        )
    }
}
