/// Fake and scripted harts.
pub mod hart;
