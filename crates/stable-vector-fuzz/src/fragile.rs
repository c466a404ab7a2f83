//! An element type whose construction and copying can fail.

use std::sync::Arc;

use crate::error::FragileError;

/// Element with a countdown: construction fails on zero, and each copy
/// gets the source's count minus one (failing if the source is at zero).
///
/// Every instance holds a clone of a shared token, so the token's strong
/// count tells how many elements are alive.
#[derive(Debug)]
pub struct Fragile {
    count: u8,
    token: Arc<()>,
}

impl Fragile {
    /// Construct with `count`, failing if it is zero.
    pub fn try_new(count: u8, token: &Arc<()>) -> Result<Self, FragileError> {
        if count == 0 {
            return Err(FragileError::Construct);
        }
        Ok(Self {
            count,
            token: Arc::clone(token),
        })
    }

    /// Copy with the count decremented, failing if it is already zero.
    pub fn try_clone(&self) -> Result<Self, FragileError> {
        let count = self.count.checked_sub(1).ok_or(FragileError::Copy)?;
        Ok(Self {
            count,
            token: Arc::clone(&self.token),
        })
    }

    /// Remaining copies before a copy fails.
    pub fn count(&self) -> u8 {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_and_copy_fail_at_zero() {
        let token = Arc::new(());
        assert_eq!(Fragile::try_new(0, &token).unwrap_err(), FragileError::Construct);
        let one = Fragile::try_new(1, &token).unwrap();
        let zero = one.try_clone().unwrap();
        assert_eq!(zero.count(), 0);
        assert_eq!(zero.try_clone().unwrap_err(), FragileError::Copy);
        assert_eq!(Arc::strong_count(&token), 3);
    }
}
