//! Line-oriented command shell over a [`Storefront`].

use std::fmt::Write as _;
use std::str::FromStr;

use checkout::{CheckoutView, PaymentMethod, ShippingAddress};
use common::ProductId;
use domain::{CartView, Product, UserProfile, WishlistOutcome, WishlistView};
use thiserror::Error;

use crate::Storefront;
use crate::error::Result;

/// Usage text printed by `help` and after unknown commands.
pub const HELP: &str = "\
commands:
  products                         list the catalog
  add <id> [qty]                   add a product to the cart
  qty <id> <n>                     set a line's quantity (0 removes it)
  remove <id>                      remove a line
  cart                             show the cart
  wish <id>                        save a product to the wishlist
  unwish <id>                      remove a product from the wishlist
  wishlist                         show the wishlist
  move <id>                        move a saved product to the cart
  login <user> [name] [phone]      sign in
  logout                           sign out and clear the session
  checkout                         start checkout
  address a|b|c|d|e|f              fullName|phone|street|city|state|postalCode
  pay gateway|cod                  choose the payment method
  edit                             go back to the address step
  submit                           place the order
  abandon                          leave checkout
  orders                           list your orders
  metrics                          show metrics
  help                             show this text
  quit                             exit";

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Products,
    Add { product_id: ProductId, quantity: u32 },
    Quantity { product_id: ProductId, quantity: u32 },
    Remove(ProductId),
    Cart,
    Wish(ProductId),
    Unwish(ProductId),
    Wishlist,
    Move(ProductId),
    Login(UserProfile),
    Logout,
    Checkout,
    Address(ShippingAddress),
    Pay(PaymentMethod),
    Edit,
    Submit,
    Abandon,
    Orders,
    Metrics,
    Help,
    Quit,
}

/// Errors from parsing a command line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown command '{0}'")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let line = line.trim();
        let (name, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let args: Vec<&str> = rest.split_whitespace().collect();

        let id = |usage: &'static str| {
            args.first()
                .map(|id| ProductId::new(*id))
                .ok_or(ParseError::Usage(usage))
        };
        let number = |arg: Option<&&str>, usage: &'static str| {
            arg.and_then(|n| n.parse::<u32>().ok())
                .ok_or(ParseError::Usage(usage))
        };

        let command = match name.to_ascii_lowercase().as_str() {
            "products" => Command::Products,
            "add" => {
                let usage = "add <id> [qty]";
                Command::Add {
                    product_id: id(usage)?,
                    quantity: match args.get(1) {
                        Some(_) => number(args.get(1), usage)?,
                        None => 1,
                    },
                }
            }
            "qty" => {
                let usage = "qty <id> <n>";
                Command::Quantity {
                    product_id: id(usage)?,
                    quantity: number(args.get(1), usage)?,
                }
            }
            "remove" => Command::Remove(id("remove <id>")?),
            "cart" => Command::Cart,
            "wish" => Command::Wish(id("wish <id>")?),
            "unwish" => Command::Unwish(id("unwish <id>")?),
            "wishlist" => Command::Wishlist,
            "move" => Command::Move(id("move <id>")?),
            "login" => {
                let user = *args
                    .first()
                    .ok_or(ParseError::Usage("login <user> [name] [phone]"))?;
                let name = args.get(1).copied().unwrap_or(user);
                let mut profile = UserProfile::new(user, name);
                if let Some(phone) = args.get(2) {
                    profile = profile.with_phone(*phone);
                }
                Command::Login(profile)
            }
            "logout" => Command::Logout,
            "checkout" => Command::Checkout,
            "address" => Command::Address(ShippingAddress::parse_pipe_separated(rest)),
            "pay" => Command::Pay(
                args.first()
                    .and_then(|m| m.parse().ok())
                    .ok_or(ParseError::Usage("pay gateway|cod"))?,
            ),
            "edit" => Command::Edit,
            "submit" => Command::Submit,
            "abandon" => Command::Abandon,
            "orders" => Command::Orders,
            "metrics" => Command::Metrics,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(ParseError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

/// Runs `command` against `storefront` and returns what to print.
///
/// `metrics`, `help` and `quit` are handled by the shell itself and only
/// return their usage text here.
pub async fn execute(storefront: &mut Storefront, command: Command) -> Result<String> {
    let output = match command {
        Command::Products => render_products(&storefront.products().await?),
        Command::Add {
            product_id,
            quantity,
        } => {
            let line = storefront.add_to_cart(&product_id, quantity).await?;
            format!(
                "added {} (now {} in cart)\n{}",
                line.name,
                line.quantity,
                render_cart(&storefront.cart())
            )
        }
        Command::Quantity {
            product_id,
            quantity,
        } => {
            if storefront.set_quantity(&product_id, quantity) {
                render_cart(&storefront.cart())
            } else {
                format!("{product_id} is not in the cart")
            }
        }
        Command::Remove(product_id) => {
            if storefront.remove_from_cart(&product_id) {
                render_cart(&storefront.cart())
            } else {
                format!("{product_id} is not in the cart")
            }
        }
        Command::Cart => render_cart(&storefront.cart()),
        Command::Wish(product_id) => match storefront.toggle_wishlist(&product_id).await? {
            WishlistOutcome::Added => format!("saved {product_id} to the wishlist"),
            WishlistOutcome::AlreadyPresent => format!("{product_id} is already in the wishlist"),
        },
        Command::Unwish(product_id) => {
            if storefront.remove_from_wishlist(&product_id) {
                format!("removed {product_id} from the wishlist")
            } else {
                format!("{product_id} is not in the wishlist")
            }
        }
        Command::Wishlist => render_wishlist(&storefront.wishlist()),
        Command::Move(product_id) => {
            let line = storefront.move_to_cart(&product_id).await?;
            format!("moved {} to the cart", line.name)
        }
        Command::Login(profile) => {
            let name = profile.name.clone();
            storefront.login(profile);
            format!("welcome, {name}\n{}", render_cart(&storefront.cart()))
        }
        Command::Logout => {
            storefront.logout();
            "logged out".to_string()
        }
        Command::Checkout => {
            let checkout = storefront.start_checkout()?;
            render_checkout(&checkout.view())
        }
        Command::Address(address) => {
            let checkout = storefront.checkout()?;
            checkout.advance_address(address)?;
            render_checkout(&checkout.view())
        }
        Command::Pay(method) => {
            let checkout = storefront.checkout()?;
            checkout.set_payment_method(method)?;
            render_checkout(&checkout.view())
        }
        Command::Edit => {
            let checkout = storefront.checkout()?;
            checkout.edit_address()?;
            render_checkout(&checkout.view())
        }
        Command::Submit => {
            let checkout = storefront.checkout()?;
            let order_id = checkout.submit().await?;
            format!("order {order_id} placed\n{}", render_checkout(&checkout.view()))
        }
        Command::Abandon => {
            storefront.abandon_checkout();
            "checkout abandoned; your cart is unchanged".to_string()
        }
        Command::Orders => {
            let orders = storefront.orders();
            if orders.is_empty() {
                "no orders yet".to_string()
            } else {
                let mut out = String::new();
                for order in orders {
                    let _ = writeln!(
                        out,
                        "{}  {}  {} items  {}  {}",
                        order.id,
                        order.placed_at.format("%Y-%m-%d %H:%M"),
                        order.totals.count,
                        order.totals.total,
                        order.payment_method
                    );
                }
                out.trim_end().to_string()
            }
        }
        Command::Metrics | Command::Help | Command::Quit => HELP.to_string(),
    };
    Ok(output)
}

fn render_products(products: &[Product]) -> String {
    let mut out = String::new();
    for p in products {
        let price = p
            .price
            .map(|m| m.to_string())
            .unwrap_or_else(|| "-".to_string());
        let stock = if p.in_stock { "" } else { "  (out of stock)" };
        let _ = writeln!(
            out,
            "{:<18} {:<28} {:>12}  {}% off{}",
            p.id, p.name, price, p.discount_percent, stock
        );
    }
    out.trim_end().to_string()
}

/// Renders the cart with its totals.
pub fn render_cart(cart: &CartView) -> String {
    if cart.is_empty() {
        return "cart is empty".to_string();
    }
    let mut out = String::new();
    for line in &cart.items {
        let _ = writeln!(
            out,
            "{:<18} {:<28} {:>3} x {:>10} = {:>12}",
            line.product_id,
            line.name,
            line.quantity,
            line.unit_price,
            line.line_total()
        );
    }
    let _ = write!(
        out,
        "items: {}  total: {}  you save: {}",
        cart.count, cart.total, cart.savings
    );
    out
}

fn render_wishlist(wishlist: &WishlistView) -> String {
    if wishlist.entries.is_empty() {
        return "wishlist is empty".to_string();
    }
    let mut out = String::new();
    for entry in &wishlist.entries {
        let _ = writeln!(out, "{:<18} {}", entry.product_id(), entry.product.name);
    }
    out.trim_end().to_string()
}

fn render_checkout(view: &CheckoutView) -> String {
    let mut out = format!("step: {}", view.step);
    if view.step.can_submit() || view.step.is_terminal() {
        let _ = write!(out, "\nship to: {}", view.address);
        let _ = write!(out, "\npayment: {}", view.payment_method);
    } else {
        let filled: Vec<_> = checkout::AddressField::ALL
            .iter()
            .filter(|f| !view.address.field(**f).is_empty())
            .map(|f| format!("{f}={}", view.address.field(*f)))
            .collect();
        if !filled.is_empty() {
            let _ = write!(out, "\naddress so far: {}", filled.join(", "));
        }
    }
    if let Some(totals) = &view.totals {
        let _ = write!(out, "\ntotal: {}", totals.total);
    }
    if let Some(order_id) = &view.order_id {
        let _ = write!(out, "\norder: {order_id}");
    }
    out
}
