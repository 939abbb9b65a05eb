// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Error types for the synchronization layer
//!
//! Only invariant violations and misuse are errors. Lookups that find nothing
//! return `Option` or an empty collection, and removing something that is not
//! there is a silent no-op.

use thiserror::Error;

/// Errors raised by the physics bridge, frame driver, plugins and config loader
#[derive(Error, Debug)]
pub enum SyncError {
    /// The physics world was initialized a second time
    #[error("physics world is already initialized")]
    AlreadyInitialized,

    /// A physics operation was attempted before `init`
    #[error("physics world is not initialized (attempted {operation})")]
    NotInitialized {
        /// Name of the rejected operation
        operation: &'static str,
    },

    /// A collision space with this name already exists
    #[error("duplicate collision space '{0}'")]
    DuplicateSpace(String),

    /// The frame driver was asked for a transition its state does not allow
    #[error("invalid frame driver transition from {from} to {to}")]
    InvalidState {
        /// State the driver was in
        from: &'static str,
        /// State that was requested
        to: &'static str,
    },

    /// A gameplay plugin failed to register or run
    #[error("plugin '{name}': {reason}")]
    Plugin {
        /// Plugin name
        name: String,
        /// What went wrong
        reason: String,
    },

    /// Configuration could not be parsed or failed validation
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Configuration file could not be read
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate
pub type SyncResult<T> = Result<T, SyncError>;
