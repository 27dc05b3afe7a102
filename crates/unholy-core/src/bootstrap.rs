//! Scoped ownership of the ephemeral bootstrap container

use unholy_platform::{Container, ContainerPlatform};

use crate::Result;

/// A running bootstrap container, torn down when this guard goes away.
///
/// Dropping the guard stops and removes the container, logging any failure.
/// Call [`release`](Self::release) to tear down explicitly and see errors.
/// A container that is already gone (it auto-removes on stop) counts as
/// successfully removed.
pub struct BootstrapContainer<'a> {
    platform: &'a dyn ContainerPlatform,
    container: Container,
    released: bool,
}

impl<'a> BootstrapContainer<'a> {
    pub(crate) fn new(platform: &'a dyn ContainerPlatform, container: Container) -> Self {
        Self {
            platform,
            container,
            released: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.container.id
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Stop and remove the container now.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        teardown(self.platform, &self.container.id)
    }
}

impl Drop for BootstrapContainer<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = teardown(self.platform, &self.container.id) {
            tracing::warn!(container = %self.container.name, error = %e, "Failed to tear down bootstrap container");
        }
    }
}

impl std::fmt::Debug for BootstrapContainer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapContainer")
            .field("container", &self.container)
            .field("released", &self.released)
            .finish()
    }
}

fn teardown(platform: &dyn ContainerPlatform, id: &str) -> Result<()> {
    tracing::debug!(container = id, "Tearing down bootstrap container");
    match platform.stop_container(id) {
        Ok(()) => {}
        Err(e) if e.is_gone() => {}
        Err(e) => return Err(e.into()),
    }
    match platform.remove_container(id, true) {
        Ok(()) => Ok(()),
        Err(e) if e.is_gone() => Ok(()),
        Err(e) => Err(e.into()),
    }
}
