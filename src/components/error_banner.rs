use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct ErrorBannerProps {
    pub message: Option<String>,
}

#[function_component(ErrorBanner)]
pub fn error_banner(props: &ErrorBannerProps) -> Html {
    match props.message.as_deref().filter(|m| !m.is_empty()) {
        Some(message) => html! {
            <div role="alert" style="background:#ef4444; color:#fff; padding:0.75em; border-radius:6px;">
                { message }
            </div>
        },
        None => html! {},
    }
}
