use crossbeam::deque::{Injector, Steal};


/// URL вместе с его позицией в исходном списке
#[derive(Debug, Clone)]
pub(crate) struct Task {
    pub index: usize,
    pub url: String,
}

/// Все задачи кладутся в очередь до старта воркеров, поэтому
/// `Steal::Empty` означает, что работа закончилась.
pub(crate) fn task_queue(urls: &[String]) -> Injector<Task> {
    let queue = Injector::new();
    for (index, url) in urls.iter().enumerate() {
        queue.push(Task {
            index,
            url: url.clone(),
        });
    }
    queue
}

#[inline]
pub(crate) fn next_task(queue: &Injector<Task>) -> Option<Task> {
    loop {
        match queue.steal() {
            Steal::Success(task) => return Some(task),
            Steal::Empty => return None,
            Steal::Retry => std::hint::spin_loop(),
        }
    }
}
