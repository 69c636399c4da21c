//! # RBAC: Role-Based Access Control
//!
//! Manages the three-role hierarchy used by the carbon ledger:
//!
//! ```text
//! SuperAdmin
//!     ├── Admin
//!     └── Auditor
//! ```
//!
//! ## Authorization context
//!
//! Component functions never read the role table themselves. They receive an
//! [`Authorizer`] from the entry point, which is [`StoredRoles`] in the
//! deployed contract and any stand-in in tests.
//!
//! ## Storage layout
//!
//! - `RbacKey::SuperAdmin` → `Address`, the one and only super-admin.
//! - `RbacKey::Role(addr)` → `Role`, the role held by `addr`, if any.
//! - `RbacKey::Members(role)` → `Vec<Address>`, holders of `role` in grant order.
//!
//! All three live in persistent storage and share the TTL policy of
//! `storage::bump_persistent`.
//!
//! ## Event emissions
//!
//! | Event topic prefix | Trigger |
//! |--------------------|---------|
//! | `role_set`         | Role granted or replaced |
//! | `role_del`         | Role revoked |
//!
//! ## Threat model notes
//!
//! - `SuperAdmin` is never granted through `grant_role`; it only moves via
//!   `transfer_super_admin`, so exactly one address holds it.
//! - `SuperAdmin` cannot be removed via `revoke_role`; use `transfer_super_admin`.
//! - An address holds **at most one role** at a time; granting a new role replaces the old one.

use soroban_sdk::{contracttype, symbol_short, Address, Env, IntoVal, Symbol, TryFromVal, Val, Vec};

use crate::storage;
use crate::Error;

/// The set of roles that can be assigned to an address.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Role {
    /// Full protocol control: can grant/revoke any role and pause.
    SuperAdmin,
    /// Can grant/revoke non-SuperAdmin roles and pause.
    Admin,
    /// Can approve or reject reduction claims.
    Auditor,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RbacKey {
    /// Maps an address → its current Role (if any).
    Role(Address),
    /// The one and only SuperAdmin address.
    SuperAdmin,
    /// Every address currently holding a role.
    Members(Role),
}

// ─────────────────────────────────────────────────────────
// Authorization context
// ─────────────────────────────────────────────────────────

/// Answers "does `account` hold `role`?" for role-gated commands.
pub trait Authorizer {
    fn has_role(&self, account: &Address, role: &Role) -> bool;
}

/// [`Authorizer`] backed by the contract's own role table.
pub struct StoredRoles<'a> {
    env: &'a Env,
}

impl<'a> StoredRoles<'a> {
    pub fn new(env: &'a Env) -> Self {
        Self { env }
    }
}

impl Authorizer for StoredRoles<'_> {
    fn has_role(&self, account: &Address, role: &Role) -> bool {
        get_role(self.env, account).as_ref() == Some(role)
    }
}

/// Fails with `Unauthorized` unless `account` holds `role`.
pub fn require_role(auth: &impl Authorizer, account: &Address, role: &Role) -> Result<(), Error> {
    if auth.has_role(account, role) {
        Ok(())
    } else {
        Err(Error::Unauthorized)
    }
}

/// Fails with `Unauthorized` unless `account` holds one of `allowed`.
pub fn require_any_of(
    auth: &impl Authorizer,
    account: &Address,
    allowed: &[Role],
) -> Result<(), Error> {
    if allowed.iter().any(|role| auth.has_role(account, role)) {
        Ok(())
    } else {
        Err(Error::Unauthorized)
    }
}

#[inline]
pub fn require_admin_or_above(auth: &impl Authorizer, account: &Address) -> Result<(), Error> {
    require_any_of(auth, account, &[Role::SuperAdmin, Role::Admin])
}

#[inline]
pub fn require_auditor(auth: &impl Authorizer, account: &Address) -> Result<(), Error> {
    require_role(auth, account, &Role::Auditor)
}

// ─────────────────────────────────────────────────────────
// Storage helpers (private)
// ─────────────────────────────────────────────────────────

fn set<V: IntoVal<Env, Val>>(env: &Env, key: &RbacKey, value: &V) {
    env.storage().persistent().set(key, value);
    storage::bump_persistent(env, key);
}

fn get<V: TryFromVal<Env, Val>>(env: &Env, key: &RbacKey) -> Option<V> {
    let value: Option<V> = env.storage().persistent().get(key);
    if value.is_some() {
        storage::bump_persistent(env, key);
    }
    value
}

fn add_member(env: &Env, role: &Role, address: &Address) {
    let mut members = role_members(env, role);
    members.push_back(address.clone());
    set(env, &RbacKey::Members(role.clone()), &members);
}

fn remove_member(env: &Env, role: &Role, address: &Address) {
    let mut members = role_members(env, role);
    if let Some(index) = members.first_index_of(address) {
        members.remove(index);
        set(env, &RbacKey::Members(role.clone()), &members);
    }
}

/// Assign `role`, replacing any previous role and keeping `Members` in step.
fn store_role(env: &Env, address: &Address, role: &Role) {
    match get_role(env, address) {
        Some(previous) if &previous == role => return,
        Some(previous) => remove_member(env, &previous, address),
        None => {}
    }
    set(env, &RbacKey::Role(address.clone()), role);
    add_member(env, role, address);
}

fn clear_role(env: &Env, address: &Address) {
    if let Some(previous) = get_role(env, address) {
        remove_member(env, &previous, address);
        env.storage()
            .persistent()
            .remove(&RbacKey::Role(address.clone()));
    }
}

/// Read the role for `address`, returning `None` if unassigned.
pub fn get_role(env: &Env, address: &Address) -> Option<Role> {
    get(env, &RbacKey::Role(address.clone()))
}

/// Read the SuperAdmin address, returning `None` before init.
pub fn get_super_admin(env: &Env) -> Option<Address> {
    get(env, &RbacKey::SuperAdmin)
}

/// Addresses holding `role`, in the order they received it.
pub fn role_members(env: &Env, role: &Role) -> Vec<Address> {
    get(env, &RbacKey::Members(role.clone())).unwrap_or_else(|| Vec::new(env))
}

// ─────────────────────────────────────────────────────────
// Initialisation
// ─────────────────────────────────────────────────────────

/// Set the initial SuperAdmin. Fails with `AlreadyInitialized` on a second call.
pub fn init_super_admin(env: &Env, super_admin: &Address) -> Result<(), Error> {
    if env.storage().persistent().has(&RbacKey::SuperAdmin) {
        return Err(Error::AlreadyInitialized);
    }
    set(env, &RbacKey::SuperAdmin, super_admin);
    store_role(env, super_admin, &Role::SuperAdmin);

    emit(env, super_admin, &Role::SuperAdmin, None);
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Role assignment
// ─────────────────────────────────────────────────────────

/// Grant `role` to `target`.
///
/// - `caller` must hold `SuperAdmin` or `Admin`.
/// - `SuperAdmin` itself is refused with `InvalidArgument` (after the caller
///   check); hand it over with [`transfer_super_admin`].
/// - The SuperAdmin cannot be demoted through this path.
///
/// Emits a `role_set` event.
pub fn grant_role(env: &Env, caller: &Address, target: &Address, role: Role) -> Result<(), Error> {
    let auth = StoredRoles::new(env);
    if role == Role::SuperAdmin {
        require_role(&auth, caller, &Role::SuperAdmin)?;
        return Err(Error::InvalidArgument);
    }
    require_admin_or_above(&auth, caller)?;

    if get_role(env, target) == Some(Role::SuperAdmin) {
        return Err(Error::Unauthorized);
    }

    store_role(env, target, &role);
    emit(env, target, &role, Some(caller.clone()));
    Ok(())
}

/// Revoke any role from `target`. Revoking from an address with no role is a no-op.
///
/// Emits a `role_del` event if a role existed.
pub fn revoke_role(env: &Env, caller: &Address, target: &Address) -> Result<(), Error> {
    require_admin_or_above(&StoredRoles::new(env), caller)?;

    if get_super_admin(env).as_ref() == Some(target) {
        return Err(Error::Unauthorized);
    }

    if get_role(env, target).is_some() {
        clear_role(env, target);
        emit_revoke(env, target, Some(caller.clone()));
    }
    Ok(())
}

/// Hand the SuperAdmin role from `current` to `new`. The only way to
/// remove a SuperAdmin.
pub fn transfer_super_admin(env: &Env, current: &Address, new: &Address) -> Result<(), Error> {
    require_role(&StoredRoles::new(env), current, &Role::SuperAdmin)?;

    clear_role(env, current);
    emit_revoke(env, current, Some(current.clone()));

    set(env, &RbacKey::SuperAdmin, new);
    store_role(env, new, &Role::SuperAdmin);
    emit(env, new, &Role::SuperAdmin, Some(current.clone()));
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────

/// Topic: `(role_set, target_address, role_symbol)`, data: `Option<caller>`.
fn emit(env: &Env, target: &Address, role: &Role, by: Option<Address>) {
    env.events().publish(
        (symbol_short!("role_set"), target.clone(), role_to_symbol(role)),
        by,
    );
}

fn emit_revoke(env: &Env, target: &Address, by: Option<Address>) {
    env.events()
        .publish((symbol_short!("role_del"), target.clone()), by);
}

fn role_to_symbol(role: &Role) -> Symbol {
    match role {
        Role::SuperAdmin => symbol_short!("supadmin"),
        Role::Admin => symbol_short!("admin"),
        Role::Auditor => symbol_short!("auditor"),
    }
}
