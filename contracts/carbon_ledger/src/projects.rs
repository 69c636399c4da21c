//! # Project Registry
//!
//! Append-only catalog of reduction projects. A project is written once at
//! registration and never mutated or removed.

use soroban_sdk::{Address, Env, String, Vec};

use crate::events;
use crate::storage::{self, Counter, DataKey};
use crate::types::Project;
use crate::Error;

/// Register a project owned by `owner`. Ids increase monotonically from 0.
pub fn register(env: &Env, owner: &Address, name: String, baseline: i128) -> Result<Project, Error> {
    if name.len() == 0 || baseline < 0 {
        return Err(Error::InvalidArgument);
    }

    let id = storage::next_id(env, Counter::Project);
    let project = Project {
        id,
        owner: owner.clone(),
        name,
        baseline,
    };

    storage::write(env, &DataKey::Project(id), &project);
    storage::push_id(env, &DataKey::OwnerProjects(owner.clone()), id);

    events::emit_project_registered(env, id, owner.clone(), baseline);
    Ok(project)
}

pub fn load(env: &Env, id: u64) -> Result<Project, Error> {
    storage::read(env, &DataKey::Project(id)).ok_or(Error::NotFound)
}

/// Ids of every project registered by `owner`, oldest first.
pub fn list_by_owner(env: &Env, owner: &Address) -> Vec<u64> {
    storage::read_ids(env, &DataKey::OwnerProjects(owner.clone()))
}

pub fn count(env: &Env) -> u64 {
    storage::count(env, Counter::Project)
}
