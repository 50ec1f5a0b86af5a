use std::{sync::Arc, time::Duration};

use tokio::{
  sync::{RwLock, watch},
  task::JoinHandle,
  time::{Instant, MissedTickBehavior},
};
use tracing::debug;

use super::Carousel;

const MIN_PERIOD: Duration = Duration::from_millis(100);

/// Advances a shared carousel on a fixed period until dropped.
pub struct AutoAdvance {
  paused: watch::Sender<bool>,
  task: JoinHandle<()>,
}

impl AutoAdvance {
  pub fn spawn(carousel: Arc<RwLock<Carousel>>, period: Duration) -> Self {
    let period = period.max(MIN_PERIOD);
    let (paused, paused_rx) = watch::channel(false);
    let task = tokio::spawn(run(carousel, period, paused_rx));
    Self { paused, task }
  }

  pub fn pause(&self) {
    self.paused.send_replace(true);
  }

  /// Resuming restarts the period from zero.
  pub fn resume(&self) {
    self.paused.send_replace(false);
  }

  pub fn is_paused(&self) -> bool {
    *self.paused.borrow()
  }
}

impl Drop for AutoAdvance {
  fn drop(&mut self) {
    self.task.abort();
  }
}

async fn run(
  carousel: Arc<RwLock<Carousel>>,
  period: Duration,
  mut paused: watch::Receiver<bool>,
) {
  let mut interval = tokio::time::interval_at(Instant::now() + period, period);
  interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

  loop {
    tokio::select! {
      _ = interval.tick() => {
        if *paused.borrow() {
          continue;
        }
        let mut carousel = carousel.write().await;
        carousel.next();
        debug!("featured carousel advanced to {}", carousel.index());
      }
      changed = paused.changed() => {
        if changed.is_err() {
          break;
        }
        if !*paused.borrow_and_update() {
          interval.reset();
        }
      }
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;

  const PERIOD: Duration = Duration::from_secs(6);

  async fn index_of(carousel: &RwLock<Carousel>) -> usize {
    carousel.read().await.index()
  }

  #[tokio::test(start_paused = true)]
  async fn test_advances_every_period() {
    let carousel = Arc::new(RwLock::new(Carousel::new(3)));
    let _ticker = AutoAdvance::spawn(carousel.clone(), PERIOD);

    tokio::time::sleep(Duration::from_millis(5_900)).await;
    assert_eq!(index_of(&carousel).await, 0);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(index_of(&carousel).await, 1);

    tokio::time::sleep(PERIOD * 2).await;
    assert_eq!(index_of(&carousel).await, 0);
  }

  #[tokio::test(start_paused = true)]
  async fn test_pause_and_resume() {
    let carousel = Arc::new(RwLock::new(Carousel::new(4)));
    let ticker = AutoAdvance::spawn(carousel.clone(), PERIOD);

    ticker.pause();
    assert!(ticker.is_paused());
    tokio::time::sleep(PERIOD * 3 + Duration::from_secs(1)).await;
    assert_eq!(index_of(&carousel).await, 0);

    ticker.resume();
    tokio::time::sleep(Duration::from_millis(6_100)).await;
    assert_eq!(index_of(&carousel).await, 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_drop_stops_ticker() {
    let carousel = Arc::new(RwLock::new(Carousel::new(2)));
    let ticker = AutoAdvance::spawn(carousel.clone(), PERIOD);
    drop(ticker);

    tokio::time::sleep(PERIOD * 2).await;
    assert_eq!(index_of(&carousel).await, 0);
  }

  #[tokio::test(start_paused = true)]
  async fn test_empty_carousel_stays_put() {
    let carousel = Arc::new(RwLock::new(Carousel::new(0)));
    let _ticker = AutoAdvance::spawn(carousel.clone(), PERIOD);
    tokio::time::sleep(PERIOD * 2).await;
    assert_eq!(index_of(&carousel).await, 0);
  }
}
