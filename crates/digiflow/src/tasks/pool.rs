use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, error, info};

use crate::db::Database;
use crate::error::TaskError;
use crate::export::DmsExport;
use crate::storage::{transfer, StorageLayout};

use super::{ProcessTask, TaskKind, TaskOutcome};

pub struct TaskManager {
    task_sender: Sender<ProcessTask>,
    outcome_receiver: Receiver<TaskOutcome>,
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl TaskManager {
    /// Starts a pool of background workers.
    ///
    /// # Panics
    /// Panics if `worker_count` is 0.
    pub fn new(db: Database, layout: StorageLayout, worker_count: usize) -> Self {
        assert!(worker_count > 0, "worker_count must be > 0");
        let (task_sender, task_receiver) = bounded::<ProcessTask>(worker_count * 2);
        let (outcome_sender, outcome_receiver) = bounded::<TaskOutcome>(worker_count * 2);
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let task_rx = task_receiver.clone();
            let outcome_tx = outcome_sender.clone();
            let shutdown_flag = Arc::clone(&shutdown);
            let worker_db = db.clone();
            let worker_layout = layout.clone();

            let handle = thread::spawn(move || {
                run_worker(
                    worker_id,
                    task_rx,
                    outcome_tx,
                    shutdown_flag,
                    worker_db,
                    worker_layout,
                );
            });

            workers.push(handle);
        }

        info!("Started {} task workers", worker_count);

        Self {
            task_sender,
            outcome_receiver,
            workers,
            shutdown,
        }
    }

    pub fn submit(&self, task: ProcessTask) -> Result<(), TaskError> {
        if self.shutdown.load(Ordering::Relaxed) {
            return Err(TaskError::ChannelClosed);
        }

        self.task_sender
            .send(task)
            .map_err(|_| TaskError::ChannelClosed)
    }

    pub fn try_recv_outcome(&self) -> Option<TaskOutcome> {
        self.outcome_receiver.try_recv().ok()
    }

    pub fn recv_outcome(&self) -> Option<TaskOutcome> {
        self.outcome_receiver.recv().ok()
    }

    pub fn shutdown(&self) {
        info!("Shutting down task workers...");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    pub fn wait(self) {
        // Drop sender to signal workers to exit
        drop(self.task_sender);

        for (i, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Task worker {} panicked: {:?}", i, e);
            } else {
                debug!("Task worker {} finished", i);
            }
        }

        info!("All task workers have stopped");
    }
}

fn run_worker(
    worker_id: usize,
    task_receiver: Receiver<ProcessTask>,
    outcome_sender: Sender<TaskOutcome>,
    shutdown: Arc<AtomicBool>,
    db: Database,
    layout: StorageLayout,
) {
    debug!("Task worker {} started", worker_id);

    loop {
        if shutdown.load(Ordering::Relaxed) {
            debug!("Task worker {} received shutdown signal", worker_id);
            break;
        }

        match task_receiver.recv_timeout(std::time::Duration::from_millis(100)) {
            Ok(task) => {
                debug!(
                    "Task worker {} running {:?} for process {}",
                    worker_id, task.kind, task.process_id
                );

                let outcome = execute(&db, &layout, &task);
                if let Err(e) = outcome_sender.send(outcome) {
                    error!("Task worker {} failed to send outcome: {}", worker_id, e);
                    break;
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                continue;
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                debug!("Task worker {} channel disconnected", worker_id);
                break;
            }
        }
    }

    debug!("Task worker {} stopped", worker_id);
}

fn execute(db: &Database, layout: &StorageLayout, task: &ProcessTask) -> TaskOutcome {
    let result = match &task.kind {
        TaskKind::SwapOut => swap_out(layout, task.process_id),
        TaskKind::SwapIn => swap_in(layout, task.process_id),
        TaskKind::Export {
            with_images,
            with_ocr,
        } => DmsExport::new(*with_images, *with_ocr)
            .run(db, layout, task.process_id)
            .map(|target| format!("Exported to {}", target.display()))
            .map_err(|e| e.to_string()),
    };

    match result {
        Ok(message) => TaskOutcome {
            task_id: task.id,
            process_id: task.process_id,
            success: true,
            message,
        },
        Err(message) => {
            error!(
                "Task {:?} for process {} failed: {}",
                task.kind, task.process_id, message
            );
            TaskOutcome {
                task_id: task.id,
                process_id: task.process_id,
                success: false,
                message,
            }
        }
    }
}

fn swap_out(layout: &StorageLayout, process_id: i64) -> Result<String, String> {
    let target = layout
        .swap_dir(process_id)
        .ok_or_else(|| "No swap volume configured".to_string())?;
    let source = layout.process_dir(process_id);
    transfer::move_dir(&source, &target).map_err(|e| e.to_string())?;
    Ok(format!("Swapped out to {}", target.display()))
}

fn swap_in(layout: &StorageLayout, process_id: i64) -> Result<String, String> {
    let source = layout
        .swap_dir(process_id)
        .ok_or_else(|| "No swap volume configured".to_string())?;
    let target = layout.process_dir(process_id);
    transfer::move_dir(&source, &target).map_err(|e| e.to_string())?;
    Ok(format!("Swapped in from {}", source.display()))
}
