//! API handlers for the teams domain

pub mod account;
pub mod invitations;
pub mod memberships;
pub mod teams;
