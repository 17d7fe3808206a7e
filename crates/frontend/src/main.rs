mod api;
mod components;
mod download;
mod pages;
mod upload;

use dioxus::prelude::*;

#[derive(Routable, Clone, PartialEq)]
enum Route {
    #[layout(NavShell)]
    #[route("/")]
    Home {},
    #[route("/upload")]
    UploadPage {},
    #[route("/files/:id")]
    FileView { id: String },
    #[route("/features/:id")]
    FeatureView { id: String },
}

#[component]
fn NavShell() -> Element {
    rsx! {
        nav { class: "topnav",
            span { class: "brand", "GIS Portal" }
            Link { to: Route::Home {}, "Home" }
            Link { to: Route::UploadPage {}, "Upload" }
        }
        main { class: "content",
            Outlet::<Route> {}
        }
    }
}

#[component]
fn Home() -> Element {
    rsx! {
        pages::home::HomePage {}
    }
}

#[component]
fn UploadPage() -> Element {
    rsx! {
        pages::upload::UploadPage {}
    }
}

#[component]
fn FileView(id: String) -> Element {
    rsx! {
        pages::file_detail::FileDetail { file_id: id }
    }
}

#[component]
fn FeatureView(id: String) -> Element {
    rsx! {
        pages::feature_detail::FeatureDetail { feature_id: id }
    }
}

const CSS: Asset = asset!("/assets/main.css");
const FAVICON: Asset = asset!("/assets/favicon.svg");

#[allow(non_snake_case)]
fn App() -> Element {
    rsx! {
        document::Link { rel: "icon", r#type: "image/svg+xml", href: FAVICON }
        document::Stylesheet { href: CSS }
        Router::<Route> {}
    }
}

fn main() {
    dioxus::logger::initialize_default();
    launch(App);
}
