//! Integration Tests Module
//!
//! End-to-end tests for the modification engine against real temporary
//! directories and a scripted model provider. No network calls are made.

// Engine routing, element edits, creation, replacement and failure results
mod engine_test;

// Version snapshots, restore, diff and file listing
mod store_test;

// Candidate scoring and confidence bands
mod locator_test;

// Retry and backoff under rate limiting
mod gateway_test;

// Plan/design/code/test loop over a batch
mod pipeline_test;
