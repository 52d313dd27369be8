// Step Navigator: the fixed sequence of editor steps and which one is active.

use serde::Serialize;

use crate::editor::{EditError, SectionKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Step {
    pub key: &'static str,
    pub title: &'static str,
    pub section: SectionKind,
}

pub const STEPS: [Step; 8] = [
    Step {
        key: "general-info",
        title: "General info",
        section: SectionKind::GeneralInfo,
    },
    Step {
        key: "personal-info",
        title: "Personal info",
        section: SectionKind::PersonalInfo,
    },
    Step {
        key: "work-experience",
        title: "Work experience",
        section: SectionKind::WorkExperiences,
    },
    Step {
        key: "education",
        title: "Education",
        section: SectionKind::Educations,
    },
    Step {
        key: "projects",
        title: "Personal projects",
        section: SectionKind::Projects,
    },
    Step {
        key: "languages",
        title: "Languages",
        section: SectionKind::Languages,
    },
    Step {
        key: "skills",
        title: "Skills",
        section: SectionKind::Skills,
    },
    Step {
        key: "summary",
        title: "Summary",
        section: SectionKind::Summary,
    },
];

fn index_of(key: &str) -> Option<usize> {
    STEPS.iter().position(|step| step.key == key)
}

pub fn find(key: &str) -> Option<&'static Step> {
    index_of(key).map(|i| &STEPS[i])
}

pub fn previous(key: &str) -> Option<&'static Step> {
    index_of(key)?.checked_sub(1).map(|i| &STEPS[i])
}

pub fn next(key: &str) -> Option<&'static Step> {
    index_of(key).and_then(|i| STEPS.get(i + 1))
}

#[derive(Debug, Clone, Serialize)]
pub struct StepView {
    pub current: Step,
    pub previous: Option<&'static str>,
    pub next: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StepNavigator {
    current: usize,
}

impl StepNavigator {
    pub fn current(&self) -> &'static Step {
        &STEPS[self.current]
    }

    /// Switches to `key`, returning the step that was active before.
    pub fn go_to(&mut self, key: &str) -> Result<&'static Step, EditError> {
        let index = index_of(key).ok_or_else(|| EditError::UnknownStep(key.to_string()))?;
        let left = self.current();
        self.current = index;
        Ok(left)
    }

    pub fn view(&self) -> StepView {
        let key = self.current().key;
        StepView {
            current: *self.current(),
            previous: previous(key).map(|s| s.key),
            next: next(key).map(|s| s.key),
        }
    }
}
