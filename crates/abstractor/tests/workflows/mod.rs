use super::*;

mod pacing;
mod resume;
mod summarize;
