use std::time::Duration;

use pager::{PagerOptions, Snapshot};
use pager_adapter::{Controller, ManualObserver};

const SENTINEL: u32 = 0;
const VIEWPORT_ROWS: usize = 12;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Example: a terminal-style list. The "visibility capability" is a ManualObserver that we
    // feed from our own notion of which rows are on screen. The sentinel is the row rendered
    // right after the last item.
    let observer = ManualObserver::new();
    let options = PagerOptions::new(|page: u64| async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok::<_, String>((0..10).map(|i| format!("row {}", (page - 1) * 10 + i)).collect())
    })
    .with_max_page(Some(5))
    .with_on_change(Some(|s: &Snapshot<String, String>| {
        println!("  snapshot: page={} rows={} loading={}", s.page, s.items.len(), s.loading);
    }));

    let controller = Controller::new(options, observer.clone(), tokio::runtime::Handle::current())
        .expect("valid options");
    controller.mount_sentinel(SENTINEL);

    // Scroll down one row per tick; the sentinel is visible once the viewport reaches the end.
    let mut scroll = 0usize;
    for _ in 0..80 {
        let rows = controller.view().data.len();
        let sentinel_visible = scroll + VIEWPORT_ROWS > rows;
        observer.set_visible(&SENTINEL, sentinel_visible);
        if scroll + VIEWPORT_ROWS <= rows {
            scroll += 1;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let view = controller.view();
    println!(
        "done: page={} rows={} observing={}",
        view.page,
        view.data.len(),
        controller.is_observing()
    );
    controller.teardown();
}
