// SPDX-License-Identifier: MPL-2.0

//! Non-public internal types and containers used by the resolver.

mod arena;
mod core;
mod incompatibility;
mod partial_solution;
mod small_map;
mod small_vec;

pub(crate) use self::arena::{Arena, HashArena, Id};
pub(crate) use self::core::State;
pub(crate) use self::incompatibility::{IncompDpId, IncompId, Incompatibility, Relation};
pub(crate) use self::partial_solution::{DecisionLevel, PartialSolution, SatisfierSearch};
pub(crate) use self::small_map::SmallMap;
pub(crate) use self::small_vec::SmallVec;
