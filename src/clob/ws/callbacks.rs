//! Event dispatch to user callbacks.

#![expect(
    clippy::same_name_method,
    reason = "Builder setters are named after the Handler notifications they register"
)]

use super::types::response::{
    BookSnapshot, LastTradePrice, PriceChange, TickSizeChange, WsMessage,
};
use crate::error::Error;
use crate::ws::Handler;

type EventCallback<T> = Box<dyn Fn(&T) + Send + Sync>;

/// The callbacks of a feed session. Every callback is optional.
///
/// Callbacks run on the read loop, one event at a time and in wire order. For each event the
/// typed callback fires first, then `on_message` with the same event.
///
/// ```
/// use polymarket_feed::clob::ws::Callbacks;
///
/// let callbacks = Callbacks::new()
///     .on_last_trade_price(|trade| println!("{} @ {}", trade.size, trade.price))
///     .on_error(|error| eprintln!("feed error: {error}"));
/// ```
#[derive(Default)]
pub struct Callbacks {
    book: Option<EventCallback<BookSnapshot>>,
    price_change: Option<EventCallback<PriceChange>>,
    tick_size_change: Option<EventCallback<TickSizeChange>>,
    last_trade_price: Option<EventCallback<LastTradePrice>>,
    message: Option<EventCallback<WsMessage>>,
    error: Option<EventCallback<Error>>,
    connect: Option<Box<dyn Fn() + Send + Sync>>,
    disconnect: Option<Box<dyn Fn(u16, &str) + Send + Sync>>,
    reconnect: Option<Box<dyn Fn(u32) + Send + Sync>>,
}

impl Callbacks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_book<F>(mut self, f: F) -> Self
    where
        F: Fn(&BookSnapshot) + Send + Sync + 'static,
    {
        self.book = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_price_change<F>(mut self, f: F) -> Self
    where
        F: Fn(&PriceChange) + Send + Sync + 'static,
    {
        self.price_change = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_tick_size_change<F>(mut self, f: F) -> Self
    where
        F: Fn(&TickSizeChange) + Send + Sync + 'static,
    {
        self.tick_size_change = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_last_trade_price<F>(mut self, f: F) -> Self
    where
        F: Fn(&LastTradePrice) + Send + Sync + 'static,
    {
        self.last_trade_price = Some(Box::new(f));
        self
    }

    /// Called for every event, after its typed callback.
    #[must_use]
    pub fn on_message<F>(mut self, f: F) -> Self
    where
        F: Fn(&WsMessage) + Send + Sync + 'static,
    {
        self.message = Some(Box::new(f));
        self
    }

    /// Decode, send and redial failures. Without this callback they are logged.
    #[must_use]
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        self.error = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_connect<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.connect = Some(Box::new(f));
        self
    }

    /// Receives the close code and reason.
    #[must_use]
    pub fn on_disconnect<F>(mut self, f: F) -> Self
    where
        F: Fn(u16, &str) + Send + Sync + 'static,
    {
        self.disconnect = Some(Box::new(f));
        self
    }

    /// Receives the attempt number, before the reconnect delay starts.
    #[must_use]
    pub fn on_reconnect<F>(mut self, f: F) -> Self
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        self.reconnect = Some(Box::new(f));
        self
    }
}

impl Handler<WsMessage> for Callbacks {
    fn on_message(&self, message: WsMessage) {
        match &message {
            WsMessage::Book(book) => call(self.book.as_ref(), book),
            WsMessage::PriceChange(change) => call(self.price_change.as_ref(), change),
            WsMessage::TickSizeChange(change) => call(self.tick_size_change.as_ref(), change),
            WsMessage::LastTradePrice(trade) => call(self.last_trade_price.as_ref(), trade),
        }

        call(self.message.as_ref(), &message);
    }

    fn on_error(&self, error: &Error) {
        if let Some(callback) = &self.error {
            callback(error);
        } else {
            #[cfg(feature = "tracing")]
            tracing::warn!(%error, "feed error with no error callback registered");
            #[cfg(not(feature = "tracing"))]
            let _: &Error = error;
        }
    }

    fn on_connect(&self) {
        if let Some(callback) = &self.connect {
            callback();
        }
    }

    fn on_disconnect(&self, code: u16, reason: &str) {
        if let Some(callback) = &self.disconnect {
            callback(code, reason);
        }
    }

    fn on_reconnect(&self, attempt: u32) {
        if let Some(callback) = &self.reconnect {
            callback(attempt);
        }
    }
}

fn call<T>(callback: Option<&EventCallback<T>>, event: &T) {
    if let Some(callback) = callback {
        callback(event);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn trade() -> WsMessage {
        WsMessage::parse(
            r#"{"event_type":"last_trade_price","market":"A","side":"SELL","price":"0.4","size":"2"}"#,
        )
        .unwrap()
    }

    #[test]
    fn typed_callback_runs_before_general() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let (typed, general) = (Arc::clone(&calls), Arc::clone(&calls));

        let callbacks = Callbacks::new()
            .on_message(move |msg| general.lock().unwrap().push(format!("message:{}", msg.event_type())))
            .on_last_trade_price(move |trade| typed.lock().unwrap().push(format!("trade:{}", trade.price)));

        Handler::on_message(&callbacks, trade());

        assert_eq!(
            *calls.lock().unwrap(),
            vec!["trade:0.4".to_owned(), "message:last_trade_price".to_owned()]
        );
    }

    #[test]
    fn other_typed_callbacks_stay_silent() {
        let books = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&books);

        let callbacks = Callbacks::new().on_book(move |_| *counter.lock().unwrap() += 1);

        Handler::on_message(&callbacks, trade());

        assert_eq!(*books.lock().unwrap(), 0);
    }

    #[test]
    fn missing_callbacks_are_no_ops() {
        let callbacks = Callbacks::new();

        Handler::on_message(&callbacks, trade());
        Handler::on_error(&callbacks, &Error::validation("ignored"));
        Handler::on_connect(&callbacks);
        Handler::on_disconnect(&callbacks, 1006, "reset");
        Handler::on_reconnect(&callbacks, 1);
    }

    #[test]
    fn lifecycle_setters_register_handler_notifications() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let (connect, disconnect, reconnect, error) = (
            Arc::clone(&calls),
            Arc::clone(&calls),
            Arc::clone(&calls),
            Arc::clone(&calls),
        );

        let callbacks = Callbacks::new()
            .on_connect(move || connect.lock().unwrap().push("connect".to_owned()))
            .on_disconnect(move |code, reason| {
                disconnect.lock().unwrap().push(format!("disconnect:{code}:{reason}"));
            })
            .on_reconnect(move |attempt| reconnect.lock().unwrap().push(format!("reconnect:{attempt}")))
            .on_error(move |e| error.lock().unwrap().push(format!("error:{:?}", e.kind())));

        Handler::on_connect(&callbacks);
        Handler::on_disconnect(&callbacks, 1006, "reset");
        Handler::on_reconnect(&callbacks, 2);
        Handler::on_error(&callbacks, &Error::validation("bad input"));

        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                "connect".to_owned(),
                "disconnect:1006:reset".to_owned(),
                "reconnect:2".to_owned(),
                "error:Validation".to_owned(),
            ]
        );
    }
}
