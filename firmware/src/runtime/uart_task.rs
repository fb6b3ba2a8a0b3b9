use embassy_futures::join::join;
use embassy_stm32 as hal;
use embassy_stm32::Peri;
use embassy_stm32::usart::{BufferedUart, Config as UartConfig, DataBits, Parity, StopBits};
use embassy_time::Timer;
use embedded_io_async::{Read, Write};
use static_cell::StaticCell;

use super::{ConsolePipe, KeyChannel};

const CONSOLE_BAUD: u32 = 115_200;
const UART_BUFFER_SIZE: usize = 128;
const CHUNK: usize = 32;

static TX_BUFFER: StaticCell<[u8; UART_BUFFER_SIZE]> = StaticCell::new();
static RX_BUFFER: StaticCell<[u8; UART_BUFFER_SIZE]> = StaticCell::new();

embassy_stm32::bind_interrupts!(struct UartIrqs {
    USART2_LPUART2 => embassy_stm32::usart::BufferedInterruptHandler<hal::peripherals::USART2>;
});

#[embassy_executor::task]
pub async fn run(
    keys: &'static KeyChannel,
    console: &'static ConsolePipe,
    usart: Peri<'static, hal::peripherals::USART2>,
    tx_pin: Peri<'static, hal::peripherals::PA2>,
    rx_pin: Peri<'static, hal::peripherals::PA3>,
) -> ! {
    let mut config = UartConfig::default();
    config.baudrate = CONSOLE_BAUD;
    config.data_bits = DataBits::DataBits8;
    config.stop_bits = StopBits::STOP1;
    config.parity = Parity::ParityNone;

    let uart = match BufferedUart::new(
        usart,
        rx_pin,
        tx_pin,
        TX_BUFFER.init([0; UART_BUFFER_SIZE]),
        RX_BUFFER.init([0; UART_BUFFER_SIZE]),
        UartIrqs,
        config,
    ) {
        Ok(uart) => uart,
        Err(_) => {
            defmt::error!("console: UART init failed");
            loop {
                core::future::pending::<()>().await;
            }
        }
    };

    let (mut uart_tx, mut uart_rx) = uart.split();

    let console_to_uart = async move {
        let mut chunk = [0u8; CHUNK];
        loop {
            let count = console.read(&mut chunk).await;
            if uart_tx.write_all(&chunk[..count]).await.is_err() {
                defmt::warn!("console: UART write error");
                Timer::after_millis(5).await;
            }
        }
    };

    let uart_to_keys = async move {
        let mut ingress = [0u8; CHUNK];
        loop {
            match uart_rx.read(&mut ingress).await {
                Ok(count) => {
                    for &byte in &ingress[..count] {
                        if keys.try_send(byte).is_err() {
                            defmt::warn!("console: key queue full, dropping {=u8:#04x}", byte);
                        }
                    }
                }
                Err(_) => {
                    defmt::warn!("console: UART read error");
                    Timer::after_millis(5).await;
                }
            }
        }
    };

    join(console_to_uart, uart_to_keys).await;
    loop {
        core::future::pending::<()>().await;
    }
}
