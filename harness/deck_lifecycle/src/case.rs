//! Test case definitions.

use deck_defer::DeferStack;
use deck_model::LifecycleStage;

use crate::context::Td;

/// A stage callback. Receives the lifecycle context for the running test.
pub type StageFn<'a> = Box<dyn FnOnce(&mut Td<'a>) + 'a>;

/// Up to four stage callbacks plus cleanup registered ahead of the run.
///
/// Absent stages are allowed; a missing stage is recorded as not started.
/// Callbacks may borrow anything that outlives the case, which is how
/// Arrange hands data to Act and Assert:
///
/// ```text
/// let user = RefCell::new(None);
/// TestCase::new()
///     .arrange(|_| *user.borrow_mut() = Some(create_user()))
///     .act(|td| sign_in(td, user.borrow().as_ref()));
/// ```
#[derive(Default)]
pub struct TestCase<'a> {
    pub(crate) arrange: Option<StageFn<'a>>,
    pub(crate) act: Option<StageFn<'a>>,
    pub(crate) assert: Option<StageFn<'a>>,
    pub(crate) after: Option<StageFn<'a>>,
    pub(crate) deferred: DeferStack<'a>,
}

impl<'a> TestCase<'a> {
    pub fn new() -> Self {
        TestCase::default()
    }

    #[must_use]
    pub fn arrange(mut self, f: impl FnOnce(&mut Td<'a>) + 'a) -> Self {
        self.arrange = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn act(mut self, f: impl FnOnce(&mut Td<'a>) + 'a) -> Self {
        self.act = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn assert(mut self, f: impl FnOnce(&mut Td<'a>) + 'a) -> Self {
        self.assert = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn after(mut self, f: impl FnOnce(&mut Td<'a>) + 'a) -> Self {
        self.after = Some(Box::new(f));
        self
    }

    /// Register a cleanup call before the test starts.
    ///
    /// Runs after `After`, together with calls registered through
    /// [`Td::defer`], most recent first.
    pub fn defer(&mut self, f: impl FnOnce() + 'a) {
        self.deferred.defer(f);
    }

    pub fn has_stage(&self, stage: LifecycleStage) -> bool {
        match stage {
            LifecycleStage::Arrange => self.arrange.is_some(),
            LifecycleStage::Act => self.act.is_some(),
            LifecycleStage::Assert => self.assert.is_some(),
            LifecycleStage::After => self.after.is_some(),
            LifecycleStage::TestSetup | LifecycleStage::TestFinished => false,
        }
    }
}

impl std::fmt::Debug for TestCase<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestCase")
            .field("arrange", &self.arrange.is_some())
            .field("act", &self.act.is_some())
            .field("assert", &self.assert.is_some())
            .field("after", &self.after.is_some())
            .field("deferred", &self.deferred)
            .finish()
    }
}
