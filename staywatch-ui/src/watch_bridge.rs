use tokio::sync::{oneshot, watch};

/// Chuyển mọi giá trị mới của `rx` vào `apply` cho tới khi `stopped` được
/// gửi hoặc bị drop, hoặc kho phía gửi biến mất.
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
pub(crate) async fn forward_changes<T: Clone>(
    mut rx: watch::Receiver<T>,
    mut stopped: oneshot::Receiver<()>,
    apply: impl Fn(T),
) {
    loop {
        tokio::select! {
            biased;
            _ = &mut stopped => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                apply(rx.borrow_and_update().clone());
            }
        }
    }
}
