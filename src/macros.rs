#![allow(unused_macros)]

/// Helper macro for locking items
///
/// ```rust, ignore
///  let mut events = lock!(self.events);
///  events.push(event);
/// ```
macro_rules! lock {
    ($lock:expr) => {
        $lock.lock().expect("Failed to acquire lock")
    };
}

/// Helper macro for reading locked items
///
/// ```rust, ignore
///  let table = read_lock!(self.annotations);
///  println!("{}", table.len());
/// ```
macro_rules! read_lock {
    ($arc_rwlock:expr) => {
        $arc_rwlock.read().expect("Failed to acquire read lock")
    };
}

/// Helper macro for writing to locked items
///
/// ```rust, ignore
///  let mut table = write_lock!(self.annotations);
///  *table = Arc::new(updated);
/// ```
macro_rules! write_lock {
    ($arc_rwlock:expr) => {
        $arc_rwlock.write().expect("Failed to acquire write lock")
    };
}

/// Helper macro for taking a cheap snapshot of a copy-on-write table
///
/// ```rust, ignore
///  let snapshot: Arc<AnnotationTable> = snapshot!(self.annotations);
/// ```
macro_rules! snapshot {
    ($arc_rwlock:expr) => {
        std::sync::Arc::clone(&*read_lock!($arc_rwlock))
    };
}

/// Helper macro for reading locked items
///
/// ```rust, ignore
///  let count = with_read!(self.inner, |graph| graph.node_count());
/// ```
macro_rules! with_read {
    ($arc_rwlock:expr, $closure:expr) => {{
        let guard = $arc_rwlock.read().expect("Failed to acquire read lock");
        $closure(&*guard)
    }};
}

/// Helper macro for writing to locked items
///
/// ```rust, ignore
///  with_write!(self.inner, |graph| graph.add_vertex(class));
/// ```
macro_rules! with_write {
    ($arc_rwlock:expr, $closure:expr) => {{
        let mut guard = $arc_rwlock.write().expect("Failed to acquire write lock");
        $closure(&mut *guard)
    }};
}
