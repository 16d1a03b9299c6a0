use yew::prelude::*;
use crate::types::LogEntry;

#[derive(Properties, PartialEq)]
pub struct LogListProps {
    pub logs: Vec<LogEntry>,
    pub on_edit: Callback<LogEntry>,
    pub on_delete: Callback<String>,
}

#[function_component(LogList)]
pub fn log_list(props: &LogListProps) -> Html {
    if props.logs.is_empty() {
        return html! {
            <ul style="list-style:none; padding:0; margin:0;">
                <li style="background:#fff; border-radius:6px; padding:1em; text-align:center; color:#333;">
                    { "No logs found" }
                </li>
            </ul>
        };
    }

    html! {
        <ul style="list-style:none; padding:0; margin:0; display:flex; flex-direction:column; gap:0.75em;">
            { for props.logs.iter().map(|log| {
                let on_edit = {
                    let callback = props.on_edit.clone();
                    let log = log.clone();
                    Callback::from(move |_: MouseEvent| callback.emit(log.clone()))
                };
                let on_delete = {
                    let callback = props.on_delete.clone();
                    let id = log.id.clone();
                    Callback::from(move |_: MouseEvent| callback.emit(id.clone()))
                };

                html! {
                    <li key={log.id.clone()} style="position:relative; background:#fff; border-radius:6px; padding:1em; box-shadow:0 1px 3px rgba(0,0,0,0.15);">
                        <span style="font-size:0.8em; color:#777;">{ log.heading() }</span>
                        <p style="margin:0.25em 0 0 0; font-size:1.1em; color:#111;">{ &log.content }</p>
                        <div style="position:absolute; top:0.75em; right:0.75em; display:flex; gap:0.5em;">
                            <button type="button" onclick={on_edit} aria-label="Edit Log"
                                style="background:#8b5cf6; color:#fff; border:none; border-radius:50%; width:24px; height:24px; cursor:pointer;">
                                { "✎" }
                            </button>
                            <button type="button" onclick={on_delete} aria-label="Delete Log"
                                style="background:#ef4444; color:#fff; border:none; border-radius:50%; width:24px; height:24px; cursor:pointer;">
                                { "✕" }
                            </button>
                        </div>
                    </li>
                }
            })}
        </ul>
    }
}
