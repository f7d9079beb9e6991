//! Access key generation
// Copyright 2025 Francisco F. Pinochet
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


use crate::key_types::AccessKey;
use rand::rngs::OsRng;
use rand::RngCore;

/// Random bytes per key
pub const KEY_BYTES: usize = 16;

/// Length of the encoded token
pub const KEY_LENGTH: usize = KEY_BYTES * 2;

/// Signature of a key source, swappable for tests
pub type KeyGenerator = fn() -> AccessKey;

/// Generate a new access key from the operating system CSPRNG
///
/// The token is the uppercase hex encoding of [`KEY_BYTES`] random bytes.
pub fn generate_key() -> AccessKey {
    let mut bytes = [0u8; KEY_BYTES];
    OsRng.fill_bytes(&mut bytes);
    AccessKey::new(hex::encode_upper(bytes))
}

/// Whether a token has the shape produced by [`generate_key`]
#[cfg(test)]
pub(crate) fn is_well_formed(token: &str) -> bool {
    token.len() == KEY_LENGTH
        && token
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
}
