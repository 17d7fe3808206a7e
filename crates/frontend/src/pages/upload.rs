use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;

use crate::components::file_upload::FileUpload;

/// Banners dismiss themselves after this long.
const BANNER_DISMISS_MS: u32 = 5_000;

#[derive(Debug, Clone, PartialEq)]
struct Banner {
    is_error: bool,
    text: String,
}

/// Upload page: the upload form plus transient result banners. Each banner
/// carries a generation so a timer from an earlier banner can never dismiss
/// a newer one.
#[component]
pub fn UploadPage() -> Element {
    let mut banner = use_signal(|| None::<Banner>);
    let mut banner_generation = use_signal(|| 0_u64);

    let mut show_banner = move |is_error: bool, text: String| {
        let my_generation = *banner_generation.peek() + 1;
        banner_generation.set(my_generation);
        banner.set(Some(Banner { is_error, text }));
        spawn(async move {
            TimeoutFuture::new(BANNER_DISMISS_MS).await;
            if *banner_generation.peek() == my_generation {
                banner.set(None);
            }
        });
    };

    rsx! {
        div { class: "page",
            h1 { "Upload" }
            if let Some(current) = banner.read().clone() {
                div {
                    class: if current.is_error { "banner banner-error" } else { "banner banner-success" },
                    "{current.text}"
                }
            }
            FileUpload {
                on_success: move |_| {
                    show_banner(false, "File uploaded and processed successfully.".to_string());
                },
                on_error: move |message: String| {
                    show_banner(true, message);
                },
            }
        }
    }
}
