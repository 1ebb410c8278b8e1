pub mod problem;
pub mod source_image;

pub use problem::{
    parse_problem_count, GenerationRequest, Problem, ProblemDraft, ProblemSet, MAX_PROBLEMS,
    MIN_PROBLEMS,
};
pub use source_image::SourceImage;
