// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod store;
mod validation;
mod weight;

pub use self::store::*;
pub use self::validation::*;
