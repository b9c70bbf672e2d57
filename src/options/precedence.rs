//! Enable/disable precedence for paired options.
//!
//! One rule serves every pair: the option that appears later in the restore
//! stream wins. Callers supply the default used when neither side appears.

use super::args::{ArgumentIndex, RestoreArgumentIndex};
use super::catalog::RestoreOption;

/// `true` when the enable side appears later than the disable side.
///
/// Two absent indices compare equal and yield `false`; callers that need a
/// different default must use [`resolve_or`].
#[inline]
pub fn resolve(enable: ArgumentIndex, disable: ArgumentIndex) -> bool {
    enable > disable
}

#[inline]
pub fn resolve_or(enable: ArgumentIndex, disable: ArgumentIndex, default: bool) -> bool {
    if !enable.is_present() && !disable.is_present() {
        default
    } else {
        resolve(enable, disable)
    }
}

/// Located positions of an enable/disable option pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TogglePair {
    pub enable: ArgumentIndex,
    pub disable: ArgumentIndex,
}

impl TogglePair {
    /// Locates both sides without consuming.
    pub fn find(args: &RestoreArgumentIndex<'_>, enable: RestoreOption, disable: RestoreOption) -> Self {
        Self {
            enable: args.find_option(enable),
            disable: args.find_option(disable),
        }
    }

    /// Locates both sides and consumes every occurrence of each.
    pub fn take(args: &mut RestoreArgumentIndex<'_>, enable: RestoreOption, disable: RestoreOption) -> Self {
        Self {
            enable: args.take_option(enable),
            disable: args.take_option(disable),
        }
    }

    pub fn is_present(&self) -> bool {
        self.enable.is_present() || self.disable.is_present()
    }

    pub fn resolve_or(&self, default: bool) -> bool {
        resolve_or(self.enable, self.disable, default)
    }

    /// `None` when neither side appeared.
    pub fn decision(&self) -> Option<bool> {
        self.is_present().then(|| resolve(self.enable, self.disable))
    }
}
