//! Internal testing utilities for the axom crates.

use std::fmt::Debug;
use std::panic::{RefUnwindSafe, UnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Run table-driven tests.
///
/// Declare a `Debug` struct, conventionally named `Case`, describing one
/// case, build a collection of them and call `test_each` with the test body.
/// Every case is run even if earlier ones panic. Afterwards, if any case
/// failed, `test_each` panics with the number of failures and their debug
/// representations.
///
/// ```
/// use axom_testing::TestCases;
///
/// #[derive(Debug)]
/// struct Case {
///     shape: [usize; 2],
///     len: usize,
/// }
///
/// let cases = [
///     Case { shape: [2, 3], len: 6 },
///     Case { shape: [0, 4], len: 0 },
/// ];
///
/// cases.test_each(|case| {
///     assert_eq!(case.shape.iter().product::<usize>(), case.len);
/// });
/// ```
///
/// Cases and values captured by the test closure must be unwind safe. Wrap
/// fields which are not in [`AssertUnwindSafe`](std::panic::AssertUnwindSafe),
/// or construct them inside the closure instead.
pub trait TestCases {
    /// The data for a single test case.
    type Case;

    /// Call `test` with a reference to each case, catching panics.
    fn test_each(self, test: impl Fn(&Self::Case) + RefUnwindSafe)
    where
        Self::Case: Debug + RefUnwindSafe;

    /// Call `test` with each case by value, catching panics.
    ///
    /// Each case is formatted before the call so that it can be reported if
    /// the test fails.
    fn test_each_value(self, test: impl Fn(Self::Case) + RefUnwindSafe)
    where
        Self::Case: Debug + UnwindSafe;
}

impl<I: IntoIterator> TestCases for I {
    type Case = I::Item;

    fn test_each(self, test: impl Fn(&I::Item) + RefUnwindSafe)
    where
        Self::Case: Debug + RefUnwindSafe,
    {
        let failures: Vec<_> = self
            .into_iter()
            .filter(|case| std::panic::catch_unwind(|| test(case)).is_err())
            .collect();
        report_failures(&failures);
    }

    fn test_each_value(self, test: impl Fn(I::Item) + RefUnwindSafe)
    where
        Self::Case: Debug + UnwindSafe,
    {
        let mut failures = Vec::new();
        for case in self {
            let test = &test;
            let case_str = format!("{:?}", case);
            if std::panic::catch_unwind(move || test(case)).is_err() {
                failures.push(case_str);
            }
        }
        report_failures(&failures);
    }
}

fn report_failures<F: Debug>(failures: &[F]) {
    assert!(
        failures.is_empty(),
        "{} test cases failed: {:?}",
        failures.len(),
        failures
    );
}

/// Source of [`DropCounter`] values which share a drop count.
///
/// Used to check that containers run each element's destructor exactly once.
#[derive(Debug, Default)]
pub struct DropTracker {
    drops: Arc<AtomicUsize>,
}

impl DropTracker {
    pub fn new() -> DropTracker {
        DropTracker::default()
    }

    /// Create an element whose drop will be counted by this tracker.
    pub fn item(&self, value: i32) -> DropCounter {
        DropCounter {
            value,
            drops: self.drops.clone(),
        }
    }

    /// Return the number of tracked elements dropped so far.
    pub fn drops(&self) -> usize {
        self.drops.load(Ordering::SeqCst)
    }
}

/// Element type which counts its drops in a shared [`DropTracker`].
///
/// It deliberately does not implement `Default` or `Copy`.
#[derive(Debug)]
pub struct DropCounter {
    value: i32,
    drops: Arc<AtomicUsize>,
}

impl DropCounter {
    pub fn value(&self) -> i32 {
        self.value
    }
}

impl Clone for DropCounter {
    fn clone(&self) -> Self {
        DropCounter {
            value: self.value,
            drops: self.drops.clone(),
        }
    }
}

impl PartialEq for DropCounter {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}
