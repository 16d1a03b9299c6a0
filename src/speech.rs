//! Dictation through the browser's speech recognition service.
//!
//! Browsers expose the recognizer either as `SpeechRecognition` or under the
//! `webkit` prefix, and some not at all. [`SpeechCapability::detect`] probes
//! for it once; when it is missing the page falls back to typed input only.

use wasm_bindgen::prelude::*;
use yew::Callback;

pub const LANGUAGE: &str = "en-US";

const CONSTRUCTORS: [&str; 2] = ["SpeechRecognition", "webkitSpeechRecognition"];

// Only the members the page uses. Declared here so the prefixed constructor
// can be cast to the same type as the standard one.
#[wasm_bindgen]
extern "C" {
    type SpeechRecognition;

    #[wasm_bindgen(method, setter)]
    fn set_continuous(this: &SpeechRecognition, value: bool);
    #[wasm_bindgen(method, setter = interimResults)]
    fn set_interim_results(this: &SpeechRecognition, value: bool);
    #[wasm_bindgen(method, setter)]
    fn set_lang(this: &SpeechRecognition, value: &str);
    #[wasm_bindgen(method, setter)]
    fn set_onstart(this: &SpeechRecognition, handler: Option<&js_sys::Function>);
    #[wasm_bindgen(method, setter)]
    fn set_onresult(this: &SpeechRecognition, handler: Option<&js_sys::Function>);
    #[wasm_bindgen(method, setter)]
    fn set_onerror(this: &SpeechRecognition, handler: Option<&js_sys::Function>);
    #[wasm_bindgen(method, setter)]
    fn set_onend(this: &SpeechRecognition, handler: Option<&js_sys::Function>);
    #[wasm_bindgen(method, catch)]
    fn start(this: &SpeechRecognition) -> Result<(), JsValue>;
    #[wasm_bindgen(method)]
    fn stop(this: &SpeechRecognition);
    #[wasm_bindgen(method)]
    fn abort(this: &SpeechRecognition);

    type SpeechRecognitionEvent;

    #[wasm_bindgen(method, getter = resultIndex)]
    fn result_index(this: &SpeechRecognitionEvent) -> u32;
    #[wasm_bindgen(method, getter)]
    fn results(this: &SpeechRecognitionEvent) -> Option<SpeechRecognitionResultList>;

    type SpeechRecognitionResultList;

    #[wasm_bindgen(method, getter)]
    fn length(this: &SpeechRecognitionResultList) -> u32;
    #[wasm_bindgen(method)]
    fn item(this: &SpeechRecognitionResultList, index: u32) -> Option<SpeechRecognitionResult>;

    type SpeechRecognitionResult;

    #[wasm_bindgen(method, getter = isFinal)]
    fn is_final(this: &SpeechRecognitionResult) -> bool;
    #[wasm_bindgen(method)]
    fn item(this: &SpeechRecognitionResult, index: u32) -> Option<SpeechRecognitionAlternative>;

    type SpeechRecognitionAlternative;

    #[wasm_bindgen(method, getter)]
    fn transcript(this: &SpeechRecognitionAlternative) -> String;
}

/// Text carried by one result event. Only `finalized` is committed to the
/// input; `interim` is the recognizer's current guess for the rest.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Transcript {
    pub finalized: String,
    pub interim: String,
}

impl Transcript {
    /// Builds a transcript from `(is_final, text)` segments in arrival order.
    pub fn from_segments<I>(segments: I) -> Self
    where
        I: IntoIterator<Item = (bool, String)>,
    {
        segments
            .into_iter()
            .fold(Self::default(), |mut transcript, (is_final, text)| {
                if is_final {
                    transcript.finalized.push_str(&text);
                } else {
                    transcript.interim.push_str(&text);
                }
                transcript
            })
    }

    fn from_event(event: &SpeechRecognitionEvent) -> Self {
        let Some(results) = event.results() else {
            return Self::default();
        };
        Self::from_segments((event.result_index()..results.length()).filter_map(|i| {
            let result = results.item(i)?;
            let best = result.item(0)?;
            Some((result.is_final(), best.transcript()))
        }))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SpeechEvent {
    Started,
    Transcript(Transcript),
    Error(String),
    Ended,
}

/// A configured recognizer plus the handlers wired into it. Dropping it
/// detaches the handlers and aborts any session in progress.
pub struct SpeechRecognizer {
    recognition: SpeechRecognition,
    _handlers: Vec<Closure<dyn FnMut(web_sys::Event)>>,
}

impl SpeechRecognizer {
    fn new(recognition: SpeechRecognition, on_event: Callback<SpeechEvent>) -> Self {
        recognition.set_continuous(true);
        recognition.set_interim_results(true);
        recognition.set_lang(LANGUAGE);

        let handler = |map: fn(web_sys::Event) -> SpeechEvent| {
            let on_event = on_event.clone();
            Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
                on_event.emit(map(event))
            })
        };

        let on_start = handler(|_| SpeechEvent::Started);
        let on_result = handler(|event| {
            SpeechEvent::Transcript(Transcript::from_event(event.unchecked_ref()))
        });
        let on_error = handler(|event| {
            let reason = js_sys::Reflect::get(&event, &JsValue::from_str("error"))
                .ok()
                .and_then(|v| v.as_string())
                .unwrap_or_else(|| "unknown".to_string());
            SpeechEvent::Error(reason)
        });
        let on_end = handler(|_| SpeechEvent::Ended);

        recognition.set_onstart(Some(on_start.as_ref().unchecked_ref()));
        recognition.set_onresult(Some(on_result.as_ref().unchecked_ref()));
        recognition.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        recognition.set_onend(Some(on_end.as_ref().unchecked_ref()));

        Self {
            recognition,
            _handlers: vec![on_start, on_result, on_error, on_end],
        }
    }

    pub fn start(&self) -> Result<(), JsValue> {
        self.recognition.start()
    }

    pub fn stop(&self) {
        self.recognition.stop();
    }
}

impl Drop for SpeechRecognizer {
    fn drop(&mut self) {
        self.recognition.set_onstart(None);
        self.recognition.set_onresult(None);
        self.recognition.set_onerror(None);
        self.recognition.set_onend(None);
        self.recognition.abort();
    }
}

#[derive(Default)]
pub enum SpeechCapability {
    Supported(SpeechRecognizer),
    #[default]
    Unsupported,
}

impl SpeechCapability {
    pub fn detect(on_event: Callback<SpeechEvent>) -> Self {
        match construct_recognition() {
            Some(recognition) => Self::Supported(SpeechRecognizer::new(recognition, on_event)),
            None => Self::Unsupported,
        }
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Supported(_))
    }

    pub fn recognizer(&self) -> Option<&SpeechRecognizer> {
        match self {
            Self::Supported(recognizer) => Some(recognizer),
            Self::Unsupported => None,
        }
    }
}

fn construct_recognition() -> Option<SpeechRecognition> {
    let window = web_sys::window()?;
    CONSTRUCTORS.iter().find_map(|name| {
        let ctor = js_sys::Reflect::get(&window, &JsValue::from_str(name)).ok()?;
        let ctor = ctor.dyn_into::<js_sys::Function>().ok()?;
        js_sys::Reflect::construct(&ctor, &js_sys::Array::new())
            .ok()
            .map(|instance| instance.unchecked_into::<SpeechRecognition>())
    })
}
