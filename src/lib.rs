//! envmigrate - run schema migrations across many database environments
//!
//! A run resolves an environment selector into a plan, then migrates each
//! planned environment in turn through a `Manager`, recording failures
//! without letting one environment stop the others.

pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod observability;
pub mod reporter;
pub mod resolver;
