use crossbeam_queue::ArrayQueue;

/// Objects that can be handed out again after a full field clear.
pub(crate) trait Reset {
    fn reset(&mut self);
}

impl<T: Reset + ?Sized> Reset for Box<T> {
    fn reset(&mut self) {
        (**self).reset();
    }
}

/// Fixed-capacity, lock-free pool of reusable objects.
///
/// Objects are reset when released, never when rented, so an idle object never carries state
/// from a previous request. Releasing into a full pool drops the object.
pub(crate) struct ObjectPool<T> {
    idle: ArrayQueue<T>,
    factory: Box<dyn Fn() -> T + Send + Sync>,
}

impl<T: Reset> ObjectPool<T> {
    pub fn new(capacity: usize, factory: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self {
            idle: ArrayQueue::new(capacity.max(1)),
            factory: Box::new(factory),
        }
    }

    pub fn rent(&self) -> T {
        self.idle.pop().unwrap_or_else(|| (self.factory)())
    }

    pub fn release(&self, mut item: T) {
        item.reset();
        // Ignore error if pool is full, the object will just be dropped.
        let _ = self.idle.push(item);
    }

    pub fn idle_count(&self) -> usize {
        self.idle.len()
    }
}
