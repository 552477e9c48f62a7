mod commands;
mod db;

use commands::{
    clients, inventory, invoices, printing, products, proformas, purchase_form, purchase_orders,
    purchases, reports, settings, suppliers,
};
use db::FormState;
use tauri::{
    menu::{Menu, MenuItem},
    tray::{MouseButton, MouseButtonState, TrayIconBuilder, TrayIconEvent},
    Manager,
};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A second init (tests, hot reload) keeps the first subscriber.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    init_tracing();

    let result = tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .setup(|app| {
            // Initialize database
            let database = db::open(app.handle())?;
            app.manage(database);
            app.manage(FormState::default());

            // Create tray menu
            let show = MenuItem::with_id(app, "show", "Afficher", true, None::<&str>)?;
            let quit = MenuItem::with_id(app, "quit", "Quitter", true, None::<&str>)?;
            let menu = Menu::with_items(app, &[&show, &quit])?;

            let mut tray = TrayIconBuilder::new()
                .tooltip("SAMA MAGASIN")
                .menu(&menu)
                .show_menu_on_left_click(false)
                .on_tray_icon_event(|tray, event| {
                    if let TrayIconEvent::Click {
                        button: MouseButton::Left,
                        button_state: MouseButtonState::Up,
                        ..
                    } = event
                    {
                        toggle_main_window(tray.app_handle());
                    }
                })
                .on_menu_event(|app, event| match event.id.0.as_str() {
                    "show" => show_main_window(app),
                    "quit" => app.exit(0),
                    _ => {}
                });
            if let Some(icon) = app.default_window_icon() {
                tray = tray.icon(icon.clone());
            }
            tray.build(app)?;

            tracing::info!("SAMA MAGASIN ready");
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            // Catalog
            products::get_categories,
            products::create_category,
            products::delete_category,
            products::get_products,
            products::search_products,
            products::create_product,
            products::update_product,
            products::delete_product,
            // Suppliers
            suppliers::get_suppliers,
            suppliers::get_supplier,
            suppliers::create_supplier,
            suppliers::update_supplier,
            suppliers::delete_supplier,
            // Clients
            clients::get_clients,
            clients::get_client,
            clients::create_client,
            clients::update_client,
            clients::delete_client,
            // Purchases
            purchases::get_purchases,
            purchases::get_purchase,
            purchases::create_purchase,
            purchases::update_purchase,
            purchases::delete_purchase,
            purchases::add_purchase_payment,
            purchases::remove_purchase_payment,
            // Purchase form
            purchase_form::get_purchase_form,
            purchase_form::reset_purchase_form,
            purchase_form::edit_purchase,
            purchase_form::set_form_header,
            purchase_form::set_form_supplier,
            purchase_form::add_form_item,
            purchase_form::add_form_product,
            purchase_form::remove_form_item,
            purchase_form::update_form_item,
            purchase_form::select_form_product,
            purchase_form::add_form_payment,
            purchase_form::remove_form_payment,
            purchase_form::update_form_payment,
            purchase_form::submit_purchase_form,
            // Inventory
            inventory::get_inventory,
            inventory::get_depots,
            inventory::get_product_stock,
            inventory::get_low_stock,
            // Invoices
            invoices::get_invoices,
            invoices::get_invoice,
            invoices::create_invoice,
            invoices::record_sale,
            invoices::add_invoice_payment,
            invoices::delete_invoice,
            // Proformas
            proformas::get_proformas,
            proformas::get_proforma,
            proformas::create_proforma,
            proformas::mark_proforma_sent,
            proformas::delete_proforma,
            proformas::convert_proforma,
            // Purchase orders
            purchase_orders::get_purchase_orders,
            purchase_orders::get_purchase_order,
            purchase_orders::create_purchase_order,
            purchase_orders::cancel_purchase_order,
            purchase_orders::receive_purchase_order,
            // Settings
            settings::get_settings,
            settings::save_settings,
            settings::get_company_settings,
            settings::load_logo,
            settings::remove_logo,
            // Printing
            printing::print_depot_slip,
            printing::print_invoice,
            printing::print_proforma,
            printing::print_receipt,
            // Reports
            reports::get_day_summary,
        ])
        .run(tauri::generate_context!());

    if let Err(e) = result {
        tracing::error!(error = %e, "error while running tauri application");
        std::process::exit(1);
    }
}

fn toggle_main_window(app: &tauri::AppHandle) {
    if let Some(window) = app.get_webview_window("main") {
        if window.is_visible().unwrap_or(false) {
            let _ = window.hide();
        } else {
            let _ = window.show();
            let _ = window.set_focus();
        }
    }
}

fn show_main_window(app: &tauri::AppHandle) {
    if let Some(window) = app.get_webview_window("main") {
        let _ = window.show();
        let _ = window.set_focus();
    }
}
