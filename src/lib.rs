//! # Question Form Library
//!
//! This library provides the answer-submission logic behind a single quiz
//! question. It tracks the user's selection, turns it into a request for a
//! scoring service, and derives the feedback shown once the service answers.
//! Questions with one correct answer are answered with radios; questions
//! with several correct answers are answered with checkboxes.

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::ignored_unit_patterns)]

pub mod constants;

pub mod feedback;
pub mod form;
pub mod question;
pub mod scoring;
pub mod selection;
pub mod session;
pub mod view;
