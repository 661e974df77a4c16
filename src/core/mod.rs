pub mod dictionary;
pub mod lint;
pub mod pipeline;
pub mod substitution;
pub mod template;
