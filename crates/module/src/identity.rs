// Copyright (c) lattice-db.dev 2025
// This file is licensed under the MIT, see license.md file

use std::{fmt, sync::Arc};

use lattice_type::{AlgebraicType, Codec, Described, bytes, register_codec};
use serde::{Deserialize, Serialize};

/// An opaque caller identity.
///
/// The payload is host-issued and carries no structure the module may rely
/// on; on the wire it travels as a single-field product holding the raw
/// bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
	bytes: Vec<u8>,
}

impl Identity {
	pub fn new(bytes: Vec<u8>) -> Self {
		Self {
			bytes,
		}
	}

	pub fn as_bytes(&self) -> &[u8] {
		&self.bytes
	}
}

impl fmt::Display for Identity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for byte in &self.bytes {
			write!(f, "{byte:02x}")?;
		}
		Ok(())
	}
}

impl Described for Identity {
	fn codec() -> Arc<Codec<Self>> {
		register_codec(|| {
			let payload = Arc::new(bytes());
			let algebraic_type =
				AlgebraicType::product([("__identity_bytes", AlgebraicType::bytes())]);
			let write_payload = Arc::clone(&payload);
			Codec::new(
				algebraic_type,
				move |reader| Ok(Identity::new(payload.read(reader)?)),
				move |writer, identity: &Identity| write_payload.write(writer, &identity.bytes),
			)
		})
	}
}
