use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use parking_lot::{Mutex, MutexGuard};

use crate::{
    config::PoolConfig,
    pool::{ObjectPool, Reset},
};

use super::{ParentLink, ResultList, ResultListId, ResultMap, ResultMapId, ResultMapList, ResultMapListId};

/// Fixed-size chunk of result nodes. Nodes keep their allocations across requests.
pub(crate) struct ResultBuffer<T> {
    nodes: Vec<T>,
    used: usize,
    capacity: usize,
}

impl<T: Default> ResultBuffer<T> {
    fn new(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            used: 0,
            capacity,
        }
    }

    fn is_full(&self) -> bool {
        self.used >= self.capacity
    }

    fn next(&mut self) -> (usize, &mut T) {
        let offset = self.used;
        self.used += 1;
        if offset == self.nodes.len() {
            self.nodes.push(T::default());
        }
        (offset, &mut self.nodes[offset])
    }

    fn get(&self, offset: usize) -> Option<&T> {
        self.nodes[..self.used].get(offset)
    }

    fn get_mut(&mut self, offset: usize) -> Option<&mut T> {
        self.nodes[..self.used].get_mut(offset)
    }

    #[cfg(test)]
    pub(crate) fn used(&self) -> usize {
        self.used
    }
}

impl<T: Reset> Reset for ResultBuffer<T> {
    fn reset(&mut self) {
        for node in &mut self.nodes[..self.used] {
            node.reset();
        }
        self.used = 0;
    }
}

/// Idle result buffers shared by every request of an engine.
pub(crate) struct ResultPool {
    buffer_size: usize,
    maps: ObjectPool<ResultBuffer<ResultMap>>,
    map_lists: ObjectPool<ResultBuffer<ResultMapList>>,
    lists: ObjectPool<ResultBuffer<ResultList>>,
}

impl ResultPool {
    pub fn new(config: &PoolConfig) -> Self {
        let buffer_size = config.result_buffer_size.max(1);
        Self {
            buffer_size,
            maps: ObjectPool::new(config.max_idle_buffers, move || ResultBuffer::new(buffer_size)),
            map_lists: ObjectPool::new(config.max_idle_buffers, move || ResultBuffer::new(buffer_size)),
            lists: ObjectPool::new(config.max_idle_buffers, move || ResultBuffer::new(buffer_size)),
        }
    }

    #[cfg(test)]
    pub(crate) fn idle_map_buffers(&self) -> usize {
        self.maps.idle_count()
    }
}

/// Nodes of one kind rented by a request. Ids encode `buffer * buffer_size + offset`.
struct NodeStore<T> {
    buffers: Vec<ResultBuffer<T>>,
}

impl<T> Default for NodeStore<T> {
    fn default() -> Self {
        Self { buffers: Vec::new() }
    }
}

impl<T: Default + Reset> NodeStore<T> {
    // Only rents a new buffer once every held buffer is exhausted.
    fn rent(&mut self, pool: &ObjectPool<ResultBuffer<T>>, buffer_size: usize) -> (u32, &mut T) {
        let chunk = match self.buffers.last() {
            Some(buffer) if !buffer.is_full() => self.buffers.len() - 1,
            _ => {
                self.buffers.push(pool.rent());
                self.buffers.len() - 1
            }
        };
        let (offset, node) = self.buffers[chunk].next();
        ((chunk * buffer_size + offset) as u32, node)
    }

    fn get(&self, id: u32, buffer_size: usize) -> Option<&T> {
        let id = id as usize;
        self.buffers.get(id / buffer_size)?.get(id % buffer_size)
    }

    fn get_mut(&mut self, id: u32, buffer_size: usize) -> Option<&mut T> {
        let id = id as usize;
        self.buffers.get_mut(id / buffer_size)?.get_mut(id % buffer_size)
    }

    fn release_into(&mut self, pool: &ObjectPool<ResultBuffer<T>>) {
        for buffer in self.buffers.drain(..) {
            pool.release(buffer);
        }
    }
}

/// Every node rented during one request.
pub(crate) struct ResultArena {
    buffer_size: usize,
    maps: NodeStore<ResultMap>,
    map_lists: NodeStore<ResultMapList>,
    lists: NodeStore<ResultList>,
}

impl ResultArena {
    pub fn map(&self, id: ResultMapId) -> Option<&ResultMap> {
        self.maps.get(id.0, self.buffer_size)
    }

    pub fn map_mut(&mut self, id: ResultMapId) -> Option<&mut ResultMap> {
        self.maps.get_mut(id.0, self.buffer_size)
    }

    pub fn map_list(&self, id: ResultMapListId) -> Option<&ResultMapList> {
        self.map_lists.get(id.0, self.buffer_size)
    }

    pub fn map_list_mut(&mut self, id: ResultMapListId) -> Option<&mut ResultMapList> {
        self.map_lists.get_mut(id.0, self.buffer_size)
    }

    pub fn list(&self, id: ResultListId) -> Option<&ResultList> {
        self.lists.get(id.0, self.buffer_size)
    }

    pub fn list_mut(&mut self, id: ResultListId) -> Option<&mut ResultList> {
        self.lists.get_mut(id.0, self.buffer_size)
    }
}

/// Owns the arena of a single request and hands its buffers back to the pool exactly once, when
/// the last reference, usually held by the serialized response, is dropped.
///
/// Every rent and write takes the arena lock for one slot update or one rent, never across an
/// await, so tasks writing distinct slots only ever wait on each other for that single update.
pub(crate) struct ResultMemoryOwner {
    pool: Arc<ResultPool>,
    arena: Mutex<ResultArena>,
    sealed: AtomicBool,
}

impl ResultMemoryOwner {
    pub fn new(pool: Arc<ResultPool>) -> Self {
        let buffer_size = pool.buffer_size;
        Self {
            pool,
            arena: Mutex::new(ResultArena {
                buffer_size,
                maps: NodeStore::default(),
                map_lists: NodeStore::default(),
                lists: NodeStore::default(),
            }),
            sealed: AtomicBool::new(false),
        }
    }

    pub fn rent_result_map(&self, capacity: usize, parent: Option<ParentLink>) -> ResultMapId {
        let mut arena = self.arena.lock();
        let buffer_size = arena.buffer_size;
        let (id, map) = arena.maps.rent(&self.pool.maps, buffer_size);
        map.initialize(capacity, parent);
        ResultMapId(id)
    }

    pub fn rent_result_map_list(&self, parent: ParentLink, is_nullable: bool) -> ResultMapListId {
        let mut arena = self.arena.lock();
        let buffer_size = arena.buffer_size;
        let (id, list) = arena.map_lists.rent(&self.pool.map_lists, buffer_size);
        list.initialize(parent, is_nullable);
        ResultMapListId(id)
    }

    pub fn rent_result_list(&self, parent: ParentLink, is_nullable: bool) -> ResultListId {
        let mut arena = self.arena.lock();
        let buffer_size = arena.buffer_size;
        let (id, list) = arena.lists.rent(&self.pool.lists, buffer_size);
        list.initialize(parent, is_nullable);
        ResultListId(id)
    }

    /// Runs `f` against the arena unless the tree was already sealed for assembly.
    pub fn write<R>(&self, f: impl FnOnce(&mut ResultArena) -> R) -> Option<R> {
        let mut arena = self.arena.lock();
        if self.sealed.load(Ordering::Acquire) {
            return None;
        }
        Some(f(&mut arena))
    }

    /// Rejects any further write. Tasks still running after a cancellation become no-ops.
    pub fn seal(&self) -> MutexGuard<'_, ResultArena> {
        let arena = self.arena.lock();
        self.sealed.store(true, Ordering::Release);
        arena
    }

    pub fn read(&self) -> MutexGuard<'_, ResultArena> {
        self.arena.lock()
    }
}

impl Drop for ResultMemoryOwner {
    fn drop(&mut self) {
        let arena = self.arena.get_mut();
        arena.maps.release_into(&self.pool.maps);
        arena.map_lists.release_into(&self.pool.map_lists);
        arena.lists.release_into(&self.pool.lists);
    }
}
