pub mod components;
pub mod project_detail;
pub mod project_form;
pub mod projects;
pub mod table;
