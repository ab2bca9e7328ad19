mod payload;
mod project;

pub use payload::{CreateProjectData, UpdateProjectData};
pub use project::{Complexity, Project, ProjectStatus};
