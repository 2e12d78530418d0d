//! Server-rendered HTML pages. Every user-supplied string passes through
//! [`escape`] before it is written into markup.

use std::fmt::Write;

use axum::http::StatusCode;
use axum::response::Html;

use crate::models::{HistoryEntry, Portfolio, Quote, Side};

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

fn layout(title: &str, signed_in: bool, main: &str) -> Html<String> {
    let nav = if signed_in {
        r#"<ul class="nav">
        <li><a href="/quote">Quote</a></li>
        <li><a href="/buy">Buy</a></li>
        <li><a href="/sell">Sell</a></li>
        <li><a href="/history">History</a></li>
      </ul>
      <ul class="nav right"><li><a href="/logout">Log Out</a></li></ul>"#
    } else {
        r#"<ul class="nav right">
        <li><a href="/register">Register</a></li>
        <li><a href="/login">Log In</a></li>
      </ul>"#
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <meta name="viewport" content="initial-scale=1, width=device-width">
    <title>C$50 Finance: {title}</title>
  </head>
  <body>
    <nav>
      <a class="brand" href="/">C$50 Finance</a>
      {nav}
    </nav>
    <main>
{main}
    </main>
  </body>
</html>
"#,
        title = escape(title),
        nav = nav,
        main = main,
    ))
}

pub fn apology(status: StatusCode, message: &str) -> Html<String> {
    let main = format!(
        r#"      <h1 class="apology">{code}</h1>
      <p class="apology">{message}</p>"#,
        code = status.as_u16(),
        message = escape(message),
    );
    layout("Apology", false, &main)
}

pub fn login_form() -> Html<String> {
    layout(
        "Log In",
        false,
        r#"      <form action="/login" method="post">
        <input autocomplete="off" autofocus name="username" placeholder="Username" type="text">
        <input name="password" placeholder="Password" type="password">
        <button type="submit">Log In</button>
      </form>"#,
    )
}

pub fn register_form() -> Html<String> {
    layout(
        "Register",
        false,
        r#"      <form action="/register" method="post">
        <input autocomplete="off" autofocus name="username" placeholder="Username" type="text">
        <input name="password" placeholder="Password" type="password">
        <input name="confirmation" placeholder="Confirm password" type="password">
        <button type="submit">Register</button>
      </form>"#,
    )
}

pub fn quote_form() -> Html<String> {
    layout(
        "Quote",
        true,
        r#"      <form action="/quote" method="post">
        <input autocomplete="off" autofocus name="symbol" placeholder="Symbol" type="text">
        <button type="submit">Quote</button>
      </form>"#,
    )
}

pub fn quoted(quote: &Quote) -> Html<String> {
    let main = format!(
        "      <p>A share of {} ({}) costs {}.</p>",
        escape(&quote.name),
        escape(&quote.symbol),
        quote.price
    );
    layout("Quoted", true, &main)
}

pub fn buy_form() -> Html<String> {
    layout(
        "Buy",
        true,
        r#"      <form action="/buy" method="post">
        <input autocomplete="off" autofocus name="symbol" placeholder="Symbol" type="text">
        <input min="1" name="shares" placeholder="Shares" type="number">
        <button type="submit">Buy</button>
      </form>"#,
    )
}

pub fn sell_form(symbols: &[String]) -> Html<String> {
    let mut options = String::new();
    for symbol in symbols {
        let symbol = escape(symbol);
        let _ = writeln!(options, r#"          <option value="{0}">{0}</option>"#, symbol);
    }

    let main = format!(
        r#"      <form action="/sell" method="post">
        <select name="symbol">
          <option disabled selected value="">Symbol</option>
{options}        </select>
        <input min="1" name="shares" placeholder="Shares" type="number">
        <button type="submit">Sell</button>
      </form>"#,
        options = options
    );
    layout("Sell", true, &main)
}

pub fn index(portfolio: &Portfolio) -> Html<String> {
    let mut rows = String::new();
    for line in &portfolio.lines {
        let price = line.price.map(|p| p.to_string()).unwrap_or_else(|| "—".to_string());
        let value = line.value.map(|v| v.to_string()).unwrap_or_else(|| "—".to_string());
        let _ = writeln!(
            rows,
            "          <tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&line.symbol),
            escape(&line.name),
            line.shares,
            price,
            value
        );
    }

    let main = format!(
        r#"      <table class="portfolio">
        <thead>
          <tr><th>Symbol</th><th>Name</th><th>Shares</th><th>Price</th><th>TOTAL</th></tr>
        </thead>
        <tbody>
{rows}          <tr><td colspan="4">CASH</td><td>{cash}</td></tr>
        </tbody>
        <tfoot>
          <tr><td colspan="4"></td><td><strong>{total}</strong></td></tr>
        </tfoot>
      </table>"#,
        rows = rows,
        cash = portfolio.cash,
        total = portfolio.total,
    );
    layout("Portfolio", true, &main)
}

pub fn history(entries: &[HistoryEntry]) -> Html<String> {
    let mut rows = String::new();
    for entry in entries {
        let side = match entry.side() {
            Side::Buy => "Bought",
            Side::Sell => "Sold",
        };
        let _ = writeln!(
            rows,
            "          <tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&entry.stock),
            side,
            entry.shares,
            entry.price,
            entry.time.format("%Y-%m-%d %H:%M:%S")
        );
    }

    let main = format!(
        r#"      <table class="history">
        <thead>
          <tr><th>Symbol</th><th>Action</th><th>Shares</th><th>Price</th><th>Transacted</th></tr>
        </thead>
        <tbody>
{rows}        </tbody>
      </table>"#,
        rows = rows
    );
    layout("History", true, &main)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PortfolioLine, Usd};

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<script>alert("x & 'y'")</script>"#),
            "&lt;script&gt;alert(&quot;x &amp; &#x27;y&#x27;&quot;)&lt;/script&gt;"
        );
    }

    #[test]
    fn test_apology_carries_status_and_escaped_message() {
        let Html(page) = apology(StatusCode::BAD_REQUEST, "bad <input>");
        assert!(page.contains("400"));
        assert!(page.contains("bad &lt;input&gt;"));
        assert!(!page.contains("<input>"));
    }

    #[test]
    fn test_index_formats_currency() {
        let portfolio = Portfolio {
            username: "alice".to_string(),
            cash: Usd::from_dollars(9000),
            lines: vec![PortfolioLine {
                symbol: "NFLX".to_string(),
                name: "Netflix".to_string(),
                shares: 10,
                price: Some(Usd::from_dollars(100)),
                value: Some(Usd::from_dollars(1000)),
            }],
            total: Usd::from_dollars(10_000),
        };
        let Html(page) = index(&portfolio);
        assert!(page.contains("$9,000.00"));
        assert!(page.contains("$1,000.00"));
        assert!(page.contains("$10,000.00"));
        assert!(page.contains("Log Out"));
    }

    #[test]
    fn test_sell_form_lists_symbols() {
        let Html(page) = sell_form(&["AAPL".to_string(), "IBM".to_string()]);
        assert!(page.contains(r#"<option value="AAPL">AAPL</option>"#));
        assert!(page.contains(r#"<option value="IBM">IBM</option>"#));
    }
}
