use std::cell::{Cell, RefCell};
use std::rc::Rc;

use web_sys::{HtmlCanvasElement, HtmlInputElement};
use yew::platform::spawn_local;
use yew::prelude::*;

use crate::api;
use crate::audio::AudioCapture;
use crate::components::{ErrorBanner, LogList};
use crate::form::{FormAction, FormState};
use crate::speech::{SpeechCapability, SpeechEvent};
use crate::types::LogEntry;

/// Re-reads the whole list. Called on mount and after every mutation.
async fn refresh(logs: UseStateHandle<Vec<LogEntry>>, error: UseStateHandle<Option<String>>) {
    match api::fetch_logs().await {
        Ok(entries) => logs.set(entries),
        Err(e) => {
            web_sys::console::error_1(&format!("Error fetching logs: {}", e).into());
            error.set(Some(e.to_string()));
        }
    }
}

#[function_component(DailyLogPage)]
pub fn daily_log_page() -> Html {
    let form = use_reducer(FormState::default);
    let logs = use_state(Vec::<LogEntry>::new);
    let error = use_state(|| None::<String>);
    let sending = use_state(|| false);
    let listening = use_state(|| false);
    let speech_supported = use_state(|| false);
    let speech = use_mut_ref(SpeechCapability::default);
    let canvas_ref = use_node_ref();

    // Probe for dictation and load the list on mount.
    {
        let dispatcher = form.dispatcher();
        let listening = listening.clone();
        let speech_supported = speech_supported.clone();
        let speech = speech.clone();
        let logs = logs.clone();
        let error = error.clone();
        use_effect_with((), move |_| {
            let on_event = Callback::from(move |event: SpeechEvent| match event {
                SpeechEvent::Started => {
                    dispatcher.dispatch(FormAction::ClearContent);
                    listening.set(true);
                }
                SpeechEvent::Transcript(transcript) => {
                    if !transcript.finalized.is_empty() {
                        dispatcher.dispatch(FormAction::AppendTranscript(transcript.finalized));
                    }
                }
                SpeechEvent::Error(reason) => {
                    web_sys::console::error_1(&format!("Speech recognition error: {}", reason).into());
                    listening.set(false);
                }
                SpeechEvent::Ended => listening.set(false),
            });

            let capability = SpeechCapability::detect(on_event);
            if !capability.is_supported() {
                web_sys::console::warn_1(&"Speech recognition is not supported in this browser.".into());
            }
            speech_supported.set(capability.is_supported());
            *speech.borrow_mut() = capability;

            error.set(None);
            spawn_local(refresh(logs, error));

            move || {
                *speech.borrow_mut() = SpeechCapability::Unsupported;
            }
        });
    }

    // The microphone and waveform only exist while listening. Leaving the
    // state runs the cleanup, which drops the capture; a capture that
    // finishes acquiring after that is dropped on arrival.
    {
        let canvas_ref = canvas_ref.clone();
        use_effect_with(*listening, move |&active| {
            let capture: Rc<RefCell<Option<AudioCapture>>> = Rc::default();
            let alive = Rc::new(Cell::new(true));

            if active {
                if let Some(canvas) = canvas_ref.cast::<HtmlCanvasElement>() {
                    let capture = capture.clone();
                    let alive = alive.clone();
                    spawn_local(async move {
                        match AudioCapture::acquire(canvas).await {
                            Ok(acquired) if alive.get() => *capture.borrow_mut() = Some(acquired),
                            Ok(_) => {}
                            Err(e) => web_sys::console::error_2(&"Error accessing microphone:".into(), &e),
                        }
                    });
                }
            }

            move || {
                alive.set(false);
                capture.borrow_mut().take();
            }
        });
    }

    let on_start_listening = {
        let speech = speech.clone();
        let listening = listening.clone();
        Callback::from(move |_: MouseEvent| {
            if let Some(recognizer) = speech.borrow().recognizer() {
                listening.set(true);
                if let Err(e) = recognizer.start() {
                    web_sys::console::error_2(&"Could not start speech recognition:".into(), &e);
                    listening.set(false);
                }
            }
        })
    };

    let on_stop_listening = {
        let speech = speech.clone();
        let listening = listening.clone();
        Callback::from(move |_: MouseEvent| {
            if let Some(recognizer) = speech.borrow().recognizer() {
                recognizer.stop();
            }
            listening.set(false);
        })
    };

    let on_content_input = {
        let form = form.clone();
        Callback::from(move |e: InputEvent| {
            let input = e.target_unchecked_into::<HtmlInputElement>();
            form.dispatch(FormAction::SetContent(input.value()));
        })
    };

    let on_date_input = {
        let form = form.clone();
        Callback::from(move |e: InputEvent| {
            let input = e.target_unchecked_into::<HtmlInputElement>();
            form.dispatch(FormAction::SetDate(input.value()));
        })
    };

    let on_submit = {
        let form = form.clone();
        let logs = logs.clone();
        let error = error.clone();
        let sending = sending.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            error.set(None);

            let form = form.clone();
            let logs = logs.clone();
            let error = error.clone();

            if let Some(update) = form.log_update() {
                spawn_local(async move {
                    match api::update_log(&update).await {
                        Ok(_) => {
                            form.dispatch(FormAction::Reset);
                            refresh(logs, error).await;
                        }
                        Err(e) => {
                            web_sys::console::error_1(&format!("Error updating log: {}", e).into());
                            error.set(Some(e.to_string()));
                        }
                    }
                });
                return;
            }

            if !form.can_create(*sending) {
                return;
            }
            let new_log = form.new_log();
            let sending = sending.clone();
            sending.set(true);
            spawn_local(async move {
                match api::create_log(&new_log).await {
                    Ok(_) => {
                        form.dispatch(FormAction::Reset);
                        sending.set(false);
                        refresh(logs, error).await;
                    }
                    Err(e) => {
                        web_sys::console::error_1(&format!("Error adding log: {}", e).into());
                        error.set(Some(e.to_string()));
                        sending.set(false);
                    }
                }
            });
        })
    };

    let on_cancel = {
        let form = form.clone();
        let error = error.clone();
        Callback::from(move |_: MouseEvent| {
            error.set(None);
            form.dispatch(FormAction::Reset);
        })
    };

    let on_edit = {
        let form = form.clone();
        let error = error.clone();
        Callback::from(move |log: LogEntry| {
            error.set(None);
            form.dispatch(FormAction::StartEdit(log));
        })
    };

    let on_delete = {
        let logs = logs.clone();
        let error = error.clone();
        Callback::from(move |id: String| {
            error.set(None);
            let logs = logs.clone();
            let error = error.clone();
            spawn_local(async move {
                match api::delete_log(id).await {
                    Ok(_) => refresh(logs, error).await,
                    Err(e) => {
                        web_sys::console::error_1(&format!("Error deleting log: {}", e).into());
                        error.set(Some(e.to_string()));
                    }
                }
            });
        })
    };

    let on_print = Callback::from(|_: MouseEvent| {
        if let Some(window) = web_sys::window() {
            let _ = window.print();
        }
    });

    let can_create = form.can_create(*sending);

    html! {
        <div style="max-width:768px; margin:1em auto; padding:2em; border-radius:12px; background:linear-gradient(135deg,#8b5cf6,#c084fc); display:flex; flex-direction:column; gap:1.5em; font-family:Arial,sans-serif;">
            <ErrorBanner message={(*error).clone()} />

            <h1 style="margin:0; text-align:center; color:#fafafa;">{ "Daily Log Tracker" }</h1>

            <form onsubmit={on_submit} style="display:flex; flex-direction:column; gap:1em;">
                <label for="log-input" style="text-align:center; color:#fafafa;">{ "Enter your log (Text or Voice)" }</label>
                <div style="display:flex; align-items:center; gap:0.5em; border:1px solid #fafafa; border-radius:999px; padding:0.5em 1em; background:rgba(255,255,255,0.2);">
                    { if *listening {
                        html! {
                            <>
                                <canvas ref={canvas_ref.clone()} id="visualizer" style="width:100%; height:48px; border-radius:999px;"></canvas>
                                <button type="button" onclick={on_stop_listening} aria-label="Stop Recording"
                                    style="width:48px; height:48px; border:none; border-radius:50%; background:#ef4444; color:#fff; cursor:pointer;">
                                    { "■" }
                                </button>
                            </>
                        }
                    } else {
                        html! {
                            <>
                                <input
                                    id="log-input"
                                    type="text"
                                    placeholder="Start typing or use voice..."
                                    value={form.content.clone()}
                                    oninput={on_content_input}
                                    disabled={*sending}
                                    style="flex:1; border:none; outline:none; background:transparent; font-size:1.1em;"
                                />
                                { if *speech_supported && !form.is_editing() {
                                    html! {
                                        <button type="button" onclick={on_start_listening} aria-label="Voice Input"
                                            style="width:48px; height:48px; border:none; border-radius:50%; background:#fff; color:#8b5cf6; cursor:pointer;">
                                            { "🎤" }
                                        </button>
                                    }
                                } else {
                                    html! {}
                                }}
                            </>
                        }
                    }}
                </div>

                <label for="log-date" style="text-align:center; color:#fafafa;">{ "Select Date" }</label>
                <div style="display:flex; border:1px solid #fafafa; border-radius:999px; padding:0.5em 1em; background:rgba(255,255,255,0.2);">
                    <input
                        id="log-date"
                        type="date"
                        value={form.date.clone()}
                        oninput={on_date_input}
                        disabled={*sending}
                        style="flex:1; border:none; outline:none; background:transparent; font-size:1.1em;"
                    />
                </div>

                { if form.is_editing() {
                    html! {
                        <div style="display:flex; gap:0.5em;">
                            <button type="submit" aria-label="Save Log"
                                style="flex:1; padding:0.75em; border:none; border-radius:999px; background:#22c55e; color:#fff; cursor:pointer;">
                                { "✓ Save" }
                            </button>
                            <button type="button" onclick={on_cancel} aria-label="Cancel Edit"
                                style="flex:1; padding:0.75em; border:none; border-radius:999px; background:#ef4444; color:#fff; cursor:pointer;">
                                { "✕ Cancel" }
                            </button>
                        </div>
                    }
                } else {
                    html! {
                        <button type="submit" disabled={!can_create}
                            style={format!(
                                "width:100%; padding:0.75em; border:none; border-radius:999px; font-weight:bold; color:#8b5cf6; {}",
                                if can_create { "background:#fff; cursor:pointer;" } else { "background:#d1d5db; cursor:not-allowed;" }
                            )}>
                            { "Add Log" }
                        </button>
                    }
                }}
            </form>

            <section style="display:flex; flex-direction:column; gap:1em;">
                <h2 style="margin:0; color:#fafafa;">{ "Today's Logs" }</h2>
                <LogList logs={(*logs).clone()} on_edit={on_edit} on_delete={on_delete} />
                <button type="button" onclick={on_print}
                    style="align-self:flex-end; padding:0.5em 1.5em; border:none; border-radius:999px; background:#fff; color:#8b5cf6; font-weight:bold; cursor:pointer;">
                    { "Print Logs" }
                </button>
            </section>
        </div>
    }
}
