//! Save/load contract shared by distributions, factories and experiments.
//!
//! An object saves itself into an [`Advocate`]: a class tag plus named
//! attributes stored as JSON values. Loading reads the attributes back into a
//! freshly constructed object of the same class. The advocate itself
//! serializes to a JSON string.
//!
//! # Example
//!
//! ```
//! use uqcore::prelude::*;
//!
//! let normal = Normal::new(1.0, 2.0).unwrap();
//! let advocate = normal.to_advocate().unwrap();
//! let json = advocate.to_json().unwrap();
//!
//! let restored = Distribution::load(&Advocate::from_json(&json).unwrap()).unwrap();
//! assert_eq!(restored.to_string(), Distribution::from(normal).to_string());
//! ```

mod advocate;

pub use advocate::Advocate;

use crate::error::Result;

/// An object that can be saved into and loaded from an [`Advocate`].
pub trait PersistentObject: Sized {
    /// Class tag written into the advocate.
    const CLASS_NAME: &'static str;

    /// Write the object's attributes.
    ///
    /// # Errors
    ///
    /// Returns an error if an attribute cannot be serialized.
    fn save(&self, advocate: &mut Advocate) -> Result<()>;

    /// Rebuild an object from its attributes.
    ///
    /// # Errors
    ///
    /// Returns a `Persistence` error if the class tag does not match or an
    /// attribute is missing or malformed, and the constructor's error if the
    /// stored values are invalid.
    fn load(advocate: &Advocate) -> Result<Self>;

    /// Save into a new advocate tagged with [`PersistentObject::CLASS_NAME`].
    ///
    /// # Errors
    ///
    /// Same as [`PersistentObject::save`].
    fn to_advocate(&self) -> Result<Advocate> {
        let mut advocate = Advocate::new(Self::CLASS_NAME);
        self.save(&mut advocate)?;
        Ok(advocate)
    }
}
