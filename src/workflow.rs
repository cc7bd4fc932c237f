//! Course creation wizard progress.
//!
//! The current step is never stored: it is derived from the navigation path
//! by finding the first step whose path prefix the path contains. Users may
//! jump back to any earlier step but never skip ahead.

/// A named wizard step and the path prefix that identifies it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WizardStep {
    pub name: &'static str,
    pub path: &'static str,
}

/// The course creation steps, in order
pub const WIZARD_STEPS: &[WizardStep] = &[
    WizardStep {
        name: "Upload",
        path: "/gen/create",
    },
    WizardStep {
        name: "Instruct",
        path: "/gen/instruct",
    },
    WizardStep {
        name: "Review",
        path: "/gen/review",
    },
    WizardStep {
        name: "Chunks",
        path: "/gen/chunks",
    },
    WizardStep {
        name: "Chat",
        path: "/gen/chat",
    },
    WizardStep {
        name: "Lessons",
        path: "/gen/lessons",
    },
    WizardStep {
        name: "Tests",
        path: "/gen/tests",
    },
];

/// Something that can move the user to a path
pub trait Navigator {
    fn navigate(&mut self, path: &str);
}

/// How a step should be displayed relative to the current one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    Completed,
    Current,
    Upcoming,
}

impl StepState {
    /// Only steps at or before the current one can be selected
    pub fn is_selectable(&self) -> bool {
        !matches!(self, StepState::Upcoming)
    }
}

/// Maps paths onto a fixed list of wizard steps
#[derive(Debug, Clone, Copy)]
pub struct WorkflowTracker {
    steps: &'static [WizardStep],
}

impl Default for WorkflowTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowTracker {
    pub fn new() -> Self {
        Self::with_steps(WIZARD_STEPS)
    }

    pub fn with_steps(steps: &'static [WizardStep]) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &'static [WizardStep] {
        self.steps
    }

    /// Index of the first step whose prefix `path` contains
    pub fn current_step_index(&self, path: &str) -> Option<usize> {
        self.steps.iter().position(|step| path.contains(step.path))
    }

    /// Trailing segment of the path, which every step but the first is scoped to
    pub fn resource_id<'a>(&self, path: &'a str) -> Option<&'a str> {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        path.rsplit('/').next().filter(|segment| !segment.is_empty())
    }

    /// Path of step `index` for the resource in `current_path`
    pub fn target_path(&self, index: usize, current_path: &str) -> Option<String> {
        let step = self.steps.get(index)?;
        if index == 0 {
            return Some(step.path.to_string());
        }
        Some(match self.resource_id(current_path) {
            Some(id) => format!("{}/{}", step.path, id),
            None => step.path.to_string(),
        })
    }

    /// Navigate to step `index` if it is not ahead of the current step.
    ///
    /// Returns whether navigation happened.
    pub fn on_step_select(
        &self,
        index: usize,
        current_path: &str,
        navigator: &mut impl Navigator,
    ) -> bool {
        let Some(current) = self.current_step_index(current_path) else {
            return false;
        };
        if index > current {
            return false;
        }
        match self.target_path(index, current_path) {
            Some(target) => {
                navigator.navigate(&target);
                true
            }
            None => false,
        }
    }

    /// Display state of every step for `path`
    pub fn step_states(&self, path: &str) -> Vec<StepState> {
        let current = self.current_step_index(path);
        (0..self.steps.len())
            .map(|i| match current {
                Some(c) if i < c => StepState::Completed,
                Some(c) if i == c => StepState::Current,
                _ => StepState::Upcoming,
            })
            .collect()
    }

    /// Fraction of the bar to fill: `(index + 1) / len`, 0 off the wizard
    pub fn progress_ratio(&self, path: &str) -> f64 {
        match self.current_step_index(path) {
            Some(index) if !self.steps.is_empty() => (index + 1) as f64 / self.steps.len() as f64,
            _ => 0.0,
        }
    }

    /// One-line rendering, e.g. `Upload > Instruct > [Review] > Chunks`
    pub fn format_progress(&self, path: &str) -> String {
        let current = self.current_step_index(path);
        self.steps
            .iter()
            .enumerate()
            .map(|(i, step)| {
                if Some(i) == current {
                    format!("[{}]", step.name)
                } else {
                    step.name.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" > ")
    }
}
