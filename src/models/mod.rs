//! Data models for roles, the organization policy, and desired state.

pub mod policy;
pub mod role;

pub use policy::{bindings_equal, Binding, Policy, SetPolicyRequest};
pub use role::{
    permission_sets_equal, update_mask, CreateRoleRequest, Role, RoleDefinition, RoleStage,
    UpdateMask,
};
